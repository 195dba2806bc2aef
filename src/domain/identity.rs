// Subject-to-identity mapping for news overlays
use serde::Serialize;
use std::collections::HashMap;

/// One visual identity a news subject renders as (marker icon resource).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: String,
    pub icon: String,
}

/// Read-only subject lookup built once at startup. Unknown subjects resolve
/// to the designated default so an event is never dropped for its subject.
#[derive(Debug, Clone)]
pub struct IdentityCatalog {
    identities: HashMap<String, Identity>,
    default: Identity,
}

impl IdentityCatalog {
    pub fn new(identities: Vec<Identity>, default_id: &str) -> Self {
        let map: HashMap<String, Identity> = identities
            .into_iter()
            .map(|identity| (identity.id.to_lowercase(), identity))
            .collect();

        let default = map
            .get(&default_id.to_lowercase())
            .cloned()
            .unwrap_or(Identity {
                id: default_id.to_lowercase(),
                icon: String::new(),
            });

        Self {
            identities: map,
            default,
        }
    }

    pub fn resolve(&self, subject: &str) -> &Identity {
        self.identities
            .get(&subject.to_lowercase())
            .unwrap_or(&self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> IdentityCatalog {
        IdentityCatalog::new(
            vec![
                Identity {
                    id: "trump".to_string(),
                    icon: "images/round/trump.png".to_string(),
                },
                Identity {
                    id: "lagarde".to_string(),
                    icon: "images/round/lagarde.png".to_string(),
                },
            ],
            "trump",
        )
    }

    #[test]
    fn resolves_known_subject_case_insensitively() {
        let c = catalog();
        assert_eq!(c.resolve("Lagarde").id, "lagarde");
        assert_eq!(c.resolve("LAGARDE").icon, "images/round/lagarde.png");
    }

    #[test]
    fn unknown_subject_falls_back_to_default() {
        let c = catalog();
        assert_eq!(c.resolve("somebody-new").id, "trump");
    }
}
