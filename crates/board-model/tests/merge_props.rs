//! Merge, truncation and timestamp properties of team documents

use board_model::{schema, Kpi, PerformanceLayout, TeamDocument, TeamId, TeamPatch};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

fn kpi_strategy() -> impl Strategy<Value = Kpi> {
    ("[A-Za-z ]{1,12}", 0.0f64..1000.0, 0.0f64..1000.0, any::<bool>()).prop_map(
        |(name, value, target, higher)| {
            let kpi = Kpi::new(name, value, target);
            if higher {
                kpi
            } else {
                kpi.lower_is_better()
            }
        },
    )
}

fn patch_strategy() -> impl Strategy<Value = TeamPatch> {
    (
        proptest::option::of(prop::collection::vec(kpi_strategy(), 0..8)),
        proptest::option::of(any::<bool>()),
        proptest::option::of("[a-z]{0,16}"),
        proptest::option::of("[a-z]{0,16}"),
    )
        .prop_map(|(kpis, show_news, team_news, safety_text)| TeamPatch {
            kpis,
            show_news,
            team_news,
            safety_text,
            ..TeamPatch::default()
        })
}

fn base() -> TeamDocument {
    schema::default_document(&TeamId::new("PUD").unwrap())
}

proptest! {
    #[test]
    fn prop_sequential_patches_equal_composed_patch(p1 in patch_strategy(), p2 in patch_strategy()) {
        let mut sequential = base();
        sequential.apply(p1.clone());
        sequential.apply(p2.clone());

        let mut composed = base();
        composed.apply(p1.then(p2));

        prop_assert_eq!(sequential, composed);
    }

    #[test]
    fn prop_later_patch_wins_on_overlap(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        let mut doc = base();
        doc.apply(TeamPatch::new().team_news(a));
        doc.apply(TeamPatch::new().team_news(b.clone()));
        prop_assert_eq!(doc.team_news(), b.as_str());
    }

    #[test]
    fn prop_layout_shrink_keeps_prefix(
        kpis in prop::collection::vec(kpi_strategy(), 0..8),
        rows in 1u32..=2,
        cols in 1u32..=4,
    ) {
        let mut doc = base();
        doc.apply(TeamPatch::new().kpis(kpis.clone()));

        let layout = PerformanceLayout::new(rows, cols).unwrap();
        let capacity = layout.capacity();
        doc.apply(TeamPatch::new().performance_layout(layout));

        let expected: Vec<Kpi> = kpis.iter().take(capacity).cloned().collect();
        prop_assert_eq!(doc.kpis.clone().unwrap(), expected);
        prop_assert!(doc.kpis().len() <= capacity);
    }

    #[test]
    fn prop_touch_never_decreases(offsets in prop::collection::vec(-3600i64..3600, 1..20)) {
        let origin = Utc.with_ymd_and_hms(2024, 7, 10, 8, 0, 0).unwrap();
        let mut doc = base();
        doc.created_at = Some(origin);
        doc.last_updated = Some(origin);

        let mut previous = origin;
        for offset in offsets {
            doc.touch(origin + Duration::seconds(offset));
            let current = doc.last_updated.unwrap();
            prop_assert!(current >= previous);
            prop_assert_eq!(doc.created_at, Some(origin));
            previous = current;
        }
    }
}

#[test]
fn disjoint_patches_commute() {
    let p1 = TeamPatch::new().team_news("x");
    let p2 = TeamPatch::new().show_safety(false);

    let mut a = base();
    a.apply(p1.clone());
    a.apply(p2.clone());

    let mut b = base();
    b.apply(p2);
    b.apply(p1);

    assert_eq!(a, b);
}
