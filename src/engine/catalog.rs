use tracing::warn;

use crate::models::station::Station;

/// Open and verified stations, or every station when that set is empty.
/// Partially migrated catalogs ship rows with the flags unset; degrading
/// beats refusing every assignment.
pub fn candidates(all: Vec<Station>) -> Vec<Station> {
    let verified: Vec<Station> = all
        .iter()
        .filter(|s| s.is_open && s.is_verified)
        .cloned()
        .collect();

    if verified.is_empty() && !all.is_empty() {
        warn!(
            total = all.len(),
            "no open+verified stations; degrading to full catalog"
        );
        return all;
    }

    verified
}

#[cfg(test)]
mod tests {
    use super::candidates;
    use crate::models::station::{CodProfile, Station};
    use chrono::Utc;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn station(open: bool, verified: bool) -> Station {
        Station {
            id: Uuid::new_v4(),
            name: "pump".to_string(),
            location: None,
            is_open: open,
            is_verified: verified,
            cod: CodProfile {
                supported: false,
                trusted: false,
                current_balance: 0,
                balance_limit: 0,
            },
            stock: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn keeps_only_open_and_verified() {
        let picked = candidates(vec![station(true, true), station(true, false), station(false, true)]);
        assert_eq!(picked.len(), 1);
    }

    #[test]
    fn degrades_to_full_catalog_when_none_qualify() {
        let picked = candidates(vec![station(false, false), station(true, false)]);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn empty_catalog_stays_empty() {
        assert!(candidates(vec![]).is_empty());
    }
}
