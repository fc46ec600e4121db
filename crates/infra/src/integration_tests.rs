//! Integration tests for the full ledger pipeline.
//!
//! Tests: request → engine → SQLite ledger + counters → projections
//!
//! Verifies:
//! - The worked warehouse scenario end to end
//! - Rejected requests leave the store untouched
//! - Deletions keep history and settle displaced stock
//! - `unallocated = total − Σ net(existing locations)` after any sequence

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use stockroom_core::{DomainError, LocationId, ProductId};
    use stockroom_inventory::{LocationRef, MovementKind, NamedMovement, ProductEdit};

    use crate::db::{InventoryStore, commit};
    use crate::engine::InventoryEngine;

    async fn setup() -> (InventoryStore, InventoryEngine) {
        let store = InventoryStore::in_memory().await.expect("in-memory store");
        (store, InventoryEngine::default())
    }

    fn movement(product: &str, from: Option<&str>, to: Option<&str>, quantity: i64) -> NamedMovement {
        NamedMovement::new(product, from, to, quantity)
    }

    #[tokio::test]
    async fn warehouse_scenario_end_to_end() {
        let (store, engine) = setup().await;

        let mut tx = store.begin().await.unwrap();
        let widget = engine.create_product(&mut tx, "Widget", 100).await.unwrap();
        let a = engine.create_location(&mut tx, "A").await.unwrap();
        let b = engine.create_location(&mut tx, "B").await.unwrap();
        commit(tx).await.unwrap();
        assert_eq!(widget.unallocated_quantity, 100);

        // Initial placement.
        let mut tx = store.begin().await.unwrap();
        let placed = engine
            .record_movement(&mut tx, &movement("Widget", None, Some("A"), 30))
            .await
            .unwrap();
        assert_eq!(placed.to_location_id, Some(a.id));
        assert_eq!(engine.product(&mut tx, widget.id).await.unwrap().unallocated_quantity, 70);
        commit(tx).await.unwrap();

        // Transfer leaves unallocated alone.
        let mut tx = store.begin().await.unwrap();
        engine
            .record_movement(&mut tx, &movement("Widget", Some("A"), Some("B"), 10))
            .await
            .unwrap();
        assert_eq!(engine.product(&mut tx, widget.id).await.unwrap().unallocated_quantity, 70);
        let rows = engine.summarize(&mut tx, &[widget.id], &[a.id, b.id]).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.net_quantity).collect::<Vec<_>>(), vec![20, 10]);
        commit(tx).await.unwrap();

        // Deallocation.
        let mut tx = store.begin().await.unwrap();
        engine
            .record_movement(&mut tx, &movement("Widget", Some("B"), None, 5))
            .await
            .unwrap();
        assert_eq!(engine.product(&mut tx, widget.id).await.unwrap().unallocated_quantity, 75);
        let rows = engine.summarize(&mut tx, &[widget.id], &[b.id]).await.unwrap();
        assert_eq!(rows[0].net_quantity, 5);
        commit(tx).await.unwrap();

        // Deleting A credits its 20 units back.
        let mut tx = store.begin().await.unwrap();
        let credited = engine.delete_location(&mut tx, a.id).await.unwrap();
        assert_eq!(credited.len(), 1);
        assert_eq!(credited[0].product_id, widget.id);
        assert_eq!(credited[0].displaced, 20);
        commit(tx).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(engine.product(&mut tx, widget.id).await.unwrap().unallocated_quantity, 95);
        assert_eq!(engine.list_movements(&mut tx).await.unwrap().len(), 3);

        let history = engine.movement_history(&mut tx).await.unwrap();
        assert_eq!(history[0].from, LocationRef::Unallocated);
        assert_eq!(history[0].to, LocationRef::Dangling(a.id));
        assert_eq!(history[1].from, LocationRef::Dangling(a.id));
        assert_eq!(history[1].to, LocationRef::Known("B".to_string()));
        assert_eq!(history[2].to, LocationRef::Unallocated);
        assert!(history.iter().all(|v| v.product_name.as_deref() == Some("Widget")));
        commit(tx).await.unwrap();

        // Raising the total raises unallocated by the same delta.
        let mut tx = store.begin().await.unwrap();
        let edited = engine.edit_product_quantity(&mut tx, widget.id, 130).await.unwrap();
        assert_eq!(edited.total_quantity, 130);
        assert_eq!(edited.unallocated_quantity, 125);
        assert!(engine.check_consistency(&mut tx).await.unwrap().is_empty());
        commit(tx).await.unwrap();
    }

    #[tokio::test]
    async fn dropped_transaction_discards_every_step() {
        let (store, engine) = setup().await;

        {
            let mut tx = store.begin().await.unwrap();
            engine.create_product(&mut tx, "Widget", 100).await.unwrap();
            engine.create_location(&mut tx, "A").await.unwrap();
            engine
                .record_movement(&mut tx, &movement("Widget", None, Some("A"), 30))
                .await
                .unwrap();
            let err = engine
                .record_movement(&mut tx, &movement("Widget", None, Some("Nowhere"), 1))
                .await
                .unwrap_err();
            assert!(err.as_domain().unwrap().is_unknown_location());
        }

        let mut conn = store.acquire().await.unwrap();
        assert!(engine.list_products(&mut conn).await.unwrap().is_empty());
        assert!(engine.list_locations(&mut conn).await.unwrap().is_empty());
        assert!(engine.list_movements(&mut conn).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn self_transfer_is_recorded_without_effect() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", 40).await.unwrap();
        let a = engine.create_location(&mut tx, "A").await.unwrap();

        let entry = engine
            .append_movement(&mut tx, p.id, Some(a.id), Some(a.id), 5)
            .await
            .unwrap();
        assert_eq!(entry.net_contribution(a.id), 0);

        let rows = engine.summarize(&mut tx, &[p.id], &[a.id]).await.unwrap();
        assert_eq!(rows[0].net_quantity, 0);
        assert_eq!(engine.product(&mut tx, p.id).await.unwrap().unallocated_quantity, 40);
        assert_eq!(engine.list_movements(&mut tx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn outbound_only_location_deletion_debits_unallocated() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", 50).await.unwrap();
        let a = engine.create_location(&mut tx, "A").await.unwrap();

        // Nothing was ever placed at A; the ledger still accepts the removal.
        engine
            .record_movement(&mut tx, &movement("Widget", Some("A"), None, 5))
            .await
            .unwrap();
        assert_eq!(engine.product(&mut tx, p.id).await.unwrap().unallocated_quantity, 55);

        let credited = engine.delete_location(&mut tx, a.id).await.unwrap();
        assert_eq!(credited[0].displaced, -5);
        assert_eq!(engine.product(&mut tx, p.id).await.unwrap().unallocated_quantity, 50);
        assert!(engine.check_consistency(&mut tx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_product_leaves_dangling_history() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", 50).await.unwrap();
        let a = engine.create_location(&mut tx, "A").await.unwrap();
        engine
            .record_movement(&mut tx, &movement("Widget", None, Some("A"), 10))
            .await
            .unwrap();

        engine.delete_product(&mut tx, p.id).await.unwrap();

        let history = engine.movement_history(&mut tx).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].product_name, None);
        assert_eq!(history[0].to, LocationRef::Known("A".to_string()));

        // Summaries still answer for the old id.
        let rows = engine.summarize(&mut tx, &[p.id], &[a.id]).await.unwrap();
        assert_eq!(rows[0].product_name, None);
        assert_eq!(rows[0].net_quantity, 10);
        assert!(engine.summarize_all(&mut tx).await.unwrap().is_empty());

        // Nothing to credit once the product itself is gone.
        assert!(engine.delete_location(&mut tx, a.id).await.unwrap().is_empty());

        let err = engine
            .record_movement(&mut tx, &movement("Widget", None, Some("A"), 1))
            .await
            .unwrap_err();
        assert!(err.as_domain().unwrap().is_unknown_product());
    }

    #[tokio::test]
    async fn names_of_deleted_records_can_be_reused() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", 50).await.unwrap();
        let a = engine.create_location(&mut tx, "A").await.unwrap();
        engine
            .record_movement(&mut tx, &movement("Widget", None, Some("A"), 10))
            .await
            .unwrap();
        engine.delete_location(&mut tx, a.id).await.unwrap();

        let a2 = engine.create_location(&mut tx, "A").await.unwrap();
        assert_ne!(a2.id, a.id);

        // The new "A" does not inherit the old one's stock.
        let rows = engine.summarize(&mut tx, &[p.id], &[a2.id]).await.unwrap();
        assert_eq!(rows[0].net_quantity, 0);
        assert_eq!(engine.product(&mut tx, p.id).await.unwrap().unallocated_quantity, 50);
    }

    #[tokio::test]
    async fn lowering_total_below_allocated_goes_negative() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", 100).await.unwrap();
        engine.create_location(&mut tx, "A").await.unwrap();
        engine
            .record_movement(&mut tx, &movement("Widget", None, Some("A"), 80))
            .await
            .unwrap();

        let edited = engine
            .edit_product(&mut tx, p.id, &ProductEdit::quantity(10))
            .await
            .unwrap();
        assert_eq!(edited.unallocated_quantity, -70);
        assert_eq!(edited.allocated_quantity(), 80);
        assert!(engine.check_consistency(&mut tx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn movement_kinds_follow_their_ends() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", 10).await.unwrap();
        let a = engine.create_location(&mut tx, "A").await.unwrap();
        let b = engine.create_location(&mut tx, "B").await.unwrap();

        for (from, to) in [(None, Some(a.id)), (Some(a.id), Some(b.id)), (Some(b.id), None)] {
            engine.append_movement(&mut tx, p.id, from, to, 1).await.unwrap();
        }
        let kinds: Vec<MovementKind> = engine
            .list_movements(&mut tx)
            .await
            .unwrap()
            .iter()
            .map(|e| MovementKind::classify(e.from_location_id, e.to_location_id).unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec![
                MovementKind::InitialPlacement { to: a.id },
                MovementKind::Transfer { from: a.id, to: b.id },
                MovementKind::Deallocation { from: b.id },
            ]
        );
    }

    #[tokio::test]
    async fn counter_overflow_rejects_movement_and_keeps_store_readable() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", 0).await.unwrap();
        let a = engine.create_location(&mut tx, "A").await.unwrap();
        engine
            .append_movement(&mut tx, p.id, None, Some(a.id), i64::MAX)
            .await
            .unwrap();
        commit(tx).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = engine
            .append_movement(&mut tx, p.id, None, Some(a.id), i64::MAX)
            .await
            .unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::InvalidQuantity(-i64::MAX)));
        drop(tx);

        let mut conn = store.acquire().await.unwrap();
        let products = engine.list_products(&mut conn).await.unwrap();
        assert_eq!(products[0].unallocated_quantity, -i64::MAX);
        assert_eq!(engine.list_movements(&mut conn).await.unwrap().len(), 1);
        assert!(engine.check_consistency(&mut conn).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn total_edit_rejects_counter_overflow() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", 0).await.unwrap();
        let a = engine.create_location(&mut tx, "A").await.unwrap();
        engine
            .append_movement(&mut tx, p.id, Some(a.id), None, i64::MAX)
            .await
            .unwrap();
        commit(tx).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = engine.edit_product_quantity(&mut tx, p.id, 1).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::InvalidQuantity(1)));
        let product = engine.product(&mut tx, p.id).await.unwrap();
        assert_eq!((product.total_quantity, product.unallocated_quantity), (0, i64::MAX));
    }

    #[tokio::test]
    async fn location_deletion_rejects_overflowing_credit() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", i64::MAX).await.unwrap();
        let a = engine.create_location(&mut tx, "A").await.unwrap();
        engine
            .append_movement(&mut tx, p.id, None, Some(a.id), 5)
            .await
            .unwrap();
        commit(tx).await.unwrap();

        // Counter at the ceiling leaves no room for the credit.
        let mut tx = store.begin().await.unwrap();
        sqlx::query("UPDATE products SET unallocated_quantity = ?1")
            .bind(i64::MAX)
            .execute(&mut *tx)
            .await
            .unwrap();
        let err = engine.delete_location(&mut tx, a.id).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::InvalidQuantity(5)));
        assert_eq!(engine.location(&mut tx, a.id).await.unwrap().name, "A");
        assert_eq!(engine.product(&mut tx, p.id).await.unwrap().unallocated_quantity, i64::MAX);
    }

    #[tokio::test]
    async fn consistency_check_reports_corrupted_counter() {
        let (store, engine) = setup().await;
        let mut tx = store.begin().await.unwrap();
        let p = engine.create_product(&mut tx, "Widget", 100).await.unwrap();
        engine.create_location(&mut tx, "A").await.unwrap();
        engine
            .record_movement(&mut tx, &movement("Widget", None, Some("A"), 30))
            .await
            .unwrap();
        commit(tx).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        sqlx::query("UPDATE products SET unallocated_quantity = unallocated_quantity + 7")
            .execute(&mut *tx)
            .await
            .unwrap();
        commit(tx).await.unwrap();

        let mut conn = store.acquire().await.unwrap();
        let drift = engine.check_consistency(&mut conn).await.unwrap();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].product_id, p.id);
        assert_eq!(drift[0].stored_unallocated, 77);
        assert_eq!(drift[0].recomputed_unallocated, 70);
        assert_eq!(drift[0].difference(), 7);
    }

    // ---- invariant under arbitrary request sequences ---------------------

    #[derive(Debug, Clone)]
    enum Op {
        Move {
            product: usize,
            from: Option<usize>,
            to: Option<usize>,
            quantity: i64,
        },
        SetTotal {
            product: usize,
            total: i64,
        },
        DeleteLocation(usize),
        AddLocation,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (0..2usize, proptest::option::of(0..4usize), proptest::option::of(0..4usize), -3i64..60)
                .prop_map(|(product, from, to, quantity)| Op::Move { product, from, to, quantity }),
            2 => (0..2usize, -5i64..400).prop_map(|(product, total)| Op::SetTotal { product, total }),
            1 => (0..4usize).prop_map(Op::DeleteLocation),
            1 => Just(Op::AddLocation),
        ]
    }

    /// Stored vs. ledger-derived unallocated quantity, per product.
    async fn replay(ops: Vec<Op>) -> Vec<(i64, i64)> {
        let (store, engine) = setup().await;

        let mut tx = store.begin().await.unwrap();
        let products: Vec<ProductId> = vec![
            engine.create_product(&mut tx, "P0", 100).await.unwrap().id,
            engine.create_product(&mut tx, "P1", 250).await.unwrap().id,
        ];
        let mut locations: Vec<LocationId> = Vec::new();
        for name in ["L0", "L1", "L2"] {
            locations.push(engine.create_location(&mut tx, name).await.unwrap().id);
        }
        commit(tx).await.unwrap();

        let mut added = 0;
        for (step, op) in ops.into_iter().enumerate() {
            let mut tx = store.begin().await.unwrap();
            let outcome = match op {
                Op::Move { product, from, to, quantity } => {
                    let pick = |i: Option<usize>| i.and_then(|i| locations.get(i).copied());
                    engine
                        .append_movement(&mut tx, products[product], pick(from), pick(to), quantity)
                        .await
                        .map(|_| ())
                }
                Op::SetTotal { product, total } => engine
                    .edit_product_quantity(&mut tx, products[product], total)
                    .await
                    .map(|_| ()),
                Op::DeleteLocation(i) => match locations.get(i) {
                    Some(id) => engine.delete_location(&mut tx, *id).await.map(|_| ()),
                    None => Ok(()),
                },
                Op::AddLocation => {
                    added += 1;
                    engine
                        .create_location(&mut tx, &format!("X{added}"))
                        .await
                        .map(|loc| locations.push(loc.id))
                }
            };
            match outcome {
                Ok(()) => commit(tx).await.unwrap(),
                Err(err) => {
                    assert!(!err.is_store_failure(), "unexpected store failure: {err}");
                    drop(tx);
                }
            }

            let mut conn = store.acquire().await.unwrap();
            let drift = engine.check_consistency(&mut conn).await.unwrap();
            assert!(drift.is_empty(), "drift after step {step}: {drift:?}");
        }

        let mut conn = store.acquire().await.unwrap();
        let existing: Vec<LocationId> = engine
            .list_locations(&mut conn)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        let ledger = engine.list_movements(&mut conn).await.unwrap();

        let mut pairs = Vec::new();
        for product in engine.list_products(&mut conn).await.unwrap() {
            let sited: i64 = ledger
                .iter()
                .filter(|e| e.product_id == product.id)
                .map(|e| existing.iter().map(|l| e.net_contribution(*l)).sum::<i64>())
                .sum();
            pairs.push((product.unallocated_quantity, product.total_quantity - sited));
        }
        assert!(engine.check_consistency(&mut conn).await.unwrap().is_empty());
        pairs
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn unallocated_matches_ledger_after_any_sequence(ops in proptest::collection::vec(op_strategy(), 0..30)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let pairs = runtime.block_on(replay(ops));
            prop_assert_eq!(pairs.len(), 2);
            for (stored, recomputed) in pairs {
                prop_assert_eq!(stored, recomputed);
            }
        }
    }

    #[test]
    fn invalid_quantities_are_domain_errors() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let (store, engine) = setup().await;
            let mut tx = store.begin().await.unwrap();
            let p = engine.create_product(&mut tx, "Widget", 10).await.unwrap();
            let a = engine.create_location(&mut tx, "A").await.unwrap();
            let err = engine
                .append_movement(&mut tx, p.id, None, Some(a.id), 0)
                .await
                .unwrap_err();
            assert_eq!(err.as_domain(), Some(&DomainError::InvalidQuantity(0)));
            let err = engine.edit_product_quantity(&mut tx, p.id, -1).await.unwrap_err();
            assert_eq!(err.as_domain(), Some(&DomainError::InvalidQuantity(-1)));
        });
    }
}
