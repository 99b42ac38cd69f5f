//! Ad rotation schedule.
//!
//! Ads are shown in a fixed circular order: the `k`-th ad break of a
//! session shows `ads[k mod len(ads)]`, where `ads` are the active ads
//! ordered by `order_index`. The schedule is stateless given the counter.

use quizgate_core::model::Ad;

/// Orders `ads` for rotation: inactive ads are dropped and the rest sorted
/// by `order_index` (ties keep their relative order).
#[must_use]
pub fn rotation_order(ads: Vec<Ad>) -> Vec<Ad> {
    let mut active: Vec<Ad> = ads.into_iter().filter(|ad| ad.is_active).collect();
    active.sort_by_key(|ad| ad.order_index);
    active
}

/// Selects the ad for break number `break_counter` from a rotation-ordered
/// slice. Returns `None` when there are no ads.
#[must_use]
pub fn next_ad(rotation: &[Ad], break_counter: u32) -> Option<&Ad> {
    if rotation.is_empty() {
        return None;
    }
    let slot = usize::try_from(break_counter).unwrap_or(usize::MAX) % rotation.len();
    rotation.get(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizgate_test_support::text_ad;

    #[test]
    fn test_next_ad_returns_none_without_ads() {
        assert!(next_ad(&[], 0).is_none());
        assert!(next_ad(&[], 7).is_none());
    }

    #[test]
    fn test_next_ad_cycles_in_order_index_order() {
        let ads = rotation_order(vec![
            text_ad(30, "third"),
            text_ad(10, "first"),
            text_ad(20, "second"),
        ]);

        let picked: Vec<i64> = (0..6)
            .map(|k| next_ad(&ads, k).unwrap().order_index)
            .collect();

        assert_eq!(picked, vec![10, 20, 30, 10, 20, 30]);
    }

    #[test]
    fn test_next_ad_is_periodic_in_number_of_ads() {
        let ads = rotation_order(vec![text_ad(1, "a"), text_ad(2, "b"), text_ad(3, "c")]);
        let period = u32::try_from(ads.len()).unwrap();

        for k in 0..20 {
            assert_eq!(next_ad(&ads, k), next_ad(&ads, k + period));
        }
    }

    #[test]
    fn test_rotation_order_drops_inactive_ads() {
        let mut hidden = text_ad(0, "hidden");
        hidden.is_active = false;

        let ads = rotation_order(vec![hidden, text_ad(5, "shown")]);

        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].order_index, 5);
    }
}
