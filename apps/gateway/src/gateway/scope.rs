//! Context Scope Resolver: the caller-owned categories a mode may read, and the
//! fetch that reads exactly those.
//!
//! The scope is the upper bound on data fetched for a mode. The prompt builder only
//! sees what `fetch_context` returns.

use anyhow::Result;
use serde_json::Value;
use uuid::Uuid;

use crate::gateway::mode::{Mode, ModeParams};
use crate::models::context::ContextBundle;
use crate::store::ContextStore;

/// How a parameterizable category is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Off,
    All,
    /// Rows tied to one application. `None` resolves to an empty collection.
    Application(Option<Uuid>),
}

impl Selection {
    pub fn is_on(&self) -> bool {
        !matches!(self, Selection::Off)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub profile: bool,
    pub schools: bool,
    pub applications: Selection,
    pub essays: bool,
    pub memory: bool,
    pub recommendations: Selection,
}

impl Scope {
    const NONE: Scope = Scope {
        profile: false,
        schools: false,
        applications: Selection::Off,
        essays: false,
        memory: false,
        recommendations: Selection::Off,
    };

    /// Names of the categories this scope reads.
    pub fn categories(&self) -> Vec<&'static str> {
        [
            ("profile", self.profile),
            ("schools", self.schools),
            ("applications", self.applications.is_on()),
            ("essays", self.essays),
            ("memory", self.memory),
            ("recommendations", self.recommendations.is_on()),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }
}

pub fn resolve_scope(params: &ModeParams) -> Scope {
    match params {
        ModeParams::Resume(_) => Scope {
            profile: true,
            ..Scope::NONE
        },
        ModeParams::Predict(_) => Scope {
            profile: true,
            schools: true,
            ..Scope::NONE
        },
        ModeParams::Recommender(p) => Scope {
            applications: Selection::Application(p.application_id),
            recommendations: Selection::Application(p.application_id),
            ..Scope::NONE
        },
        ModeParams::Coach(_) => Scope {
            profile: true,
            applications: Selection::All,
            essays: true,
            memory: true,
            ..Scope::NONE
        },
    }
}

/// Total over any mode string: unrecognized modes get the coach scope, and params
/// that do not parse are treated as absent.
pub fn resolve_scope_lenient(mode: &str, params: Option<&Value>) -> Scope {
    let mode = Mode::or_coach(mode);
    let params = ModeParams::parse(mode, params.cloned())
        .or_else(|_| ModeParams::parse(mode, None))
        .unwrap_or(ModeParams::Coach(Default::default()));
    resolve_scope(&params)
}

/// Which application filter to read with, or `None` to skip the read entirely.
fn rows_to_read(selection: Selection) -> Option<Option<Uuid>> {
    match selection {
        Selection::Off | Selection::Application(None) => None,
        Selection::All => Some(None),
        Selection::Application(Some(id)) => Some(Some(id)),
    }
}

/// One read per category the scope turns on, issued concurrently.
pub async fn fetch_context(
    store: &dyn ContextStore,
    caller_id: &str,
    scope: &Scope,
) -> Result<ContextBundle> {
    let profile = async {
        if scope.profile {
            store.fetch_profile(caller_id).await
        } else {
            Ok(None)
        }
    };
    let schools = async {
        if scope.schools {
            store.fetch_schools(caller_id).await
        } else {
            Ok(Vec::new())
        }
    };
    let applications = async {
        match rows_to_read(scope.applications) {
            Some(filter) => store.fetch_applications(caller_id, filter).await,
            None => Ok(Vec::new()),
        }
    };
    let essays = async {
        if scope.essays {
            store.fetch_essays(caller_id).await
        } else {
            Ok(Vec::new())
        }
    };
    let memory = async {
        if scope.memory {
            store.fetch_memory(caller_id).await
        } else {
            Ok(Vec::new())
        }
    };
    let recommendations = async {
        match rows_to_read(scope.recommendations) {
            Some(filter) => store.fetch_recommendations(caller_id, filter).await,
            None => Ok(Vec::new()),
        }
    };

    let (profile, schools, applications, essays, memory, recommendations) = tokio::try_join!(
        profile,
        schools,
        applications,
        essays,
        memory,
        recommendations
    )?;

    Ok(ContextBundle {
        profile,
        schools,
        applications,
        essays,
        memory,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mode::{
        CoachParams, PredictParams, RecommenderParams, ResumeParams,
    };
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_every_mode_maps_to_its_declared_categories() {
        let cases = [
            (ModeParams::Resume(ResumeParams::default()), vec!["profile"]),
            (
                ModeParams::Predict(PredictParams::default()),
                vec!["profile", "schools"],
            ),
            (
                ModeParams::Recommender(RecommenderParams::default()),
                vec!["applications", "recommendations"],
            ),
            (
                ModeParams::Coach(CoachParams::default()),
                vec!["profile", "applications", "essays", "memory"],
            ),
        ];
        for (params, expected) in cases {
            assert_eq!(resolve_scope(&params).categories(), expected, "{:?}", params.mode());
        }
    }

    #[test]
    fn test_recommender_passes_application_id_through() {
        let id = Uuid::new_v4();
        let scope = resolve_scope(&ModeParams::Recommender(RecommenderParams {
            application_id: Some(id),
        }));
        assert_eq!(scope.applications, Selection::Application(Some(id)));
        assert_eq!(scope.recommendations, Selection::Application(Some(id)));
    }

    #[test]
    fn test_unrecognized_mode_resolves_to_coach_scope() {
        let coach = resolve_scope(&ModeParams::Coach(CoachParams::default()));
        assert_eq!(resolve_scope_lenient("bogus", None), coach);
        assert_eq!(resolve_scope_lenient("", Some(&json!("junk"))), coach);
    }

    #[test]
    fn test_lenient_resolution_ignores_unparseable_params() {
        let scope = resolve_scope_lenient("recommender", Some(&json!({"applicationId": 9})));
        assert_eq!(scope.applications, Selection::Application(None));
    }

    #[tokio::test]
    async fn test_fetch_reads_only_scoped_categories() {
        let store = MemoryStore::new();
        store.set_profile("user-42", json!({"first_name": "Ada"}));
        store.set_essays("user-42", vec![json!({"title": "Why MBA"})]);

        let scope = resolve_scope(&ModeParams::Predict(PredictParams::default()));
        let bundle = fetch_context(&store, "user-42", &scope).await.unwrap();

        assert_eq!(store.reads(), vec!["profile", "schools"]);
        assert_eq!(bundle.profile, Some(json!({"first_name": "Ada"})));
        assert!(bundle.essays.is_empty(), "essays are outside the predict scope");
    }

    #[tokio::test]
    async fn test_recommender_without_application_reads_nothing() {
        let store = MemoryStore::new();
        store.set_recommendations("user-42", vec![json!({"application_id": "x"})]);

        let scope = resolve_scope(&ModeParams::Recommender(RecommenderParams::default()));
        let bundle = fetch_context(&store, "user-42", &scope).await.unwrap();

        assert!(store.reads().is_empty());
        assert!(bundle.recommendations.is_empty());
        assert!(bundle.applications.is_empty());
    }

    #[tokio::test]
    async fn test_recommender_filters_by_application() {
        let store = MemoryStore::new();
        let wanted = Uuid::new_v4();
        store.set_applications(
            "user-42",
            vec![json!({"id": wanted.to_string()}), json!({"id": Uuid::new_v4().to_string()})],
        );
        store.set_recommendations(
            "user-42",
            vec![
                json!({"application_id": wanted.to_string(), "recommender": "Dr. Okafor"}),
                json!({"application_id": Uuid::new_v4().to_string()}),
            ],
        );

        let scope = resolve_scope(&ModeParams::Recommender(RecommenderParams {
            application_id: Some(wanted),
        }));
        let bundle = fetch_context(&store, "user-42", &scope).await.unwrap();

        assert_eq!(bundle.applications.len(), 1);
        assert_eq!(bundle.recommendations.len(), 1);
        assert_eq!(bundle.recommendations[0]["recommender"], "Dr. Okafor");
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = MemoryStore::failing();
        let scope = resolve_scope(&ModeParams::Resume(ResumeParams::default()));
        assert!(fetch_context(&store, "user-42", &scope).await.is_err());
    }
}
