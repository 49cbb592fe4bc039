mod memory;

#[cfg(test)]
mod tests {
    use crate::memory::{MemoryQuery, MemoryService, failing, lookup_service};
    use statement_vtab_core::{
        ArgumentOrder, CursorState, PlanEstimates, StatementError, StatementRelation, Value,
        VirtualCursor, VirtualRelation,
    };

    const TABLE: &[(i64, &str)] = &[(1, "a"), (2, "b"), (2, "c")];

    fn relation(service: &MemoryService) -> StatementRelation<MemoryService> {
        StatementRelation::declare(
            service.clone(),
            Some("(SELECT v FROM t WHERE k = :k)"),
            PlanEstimates::default(),
        )
        .expect("Could not declare the relation")
    }

    fn collect<C: VirtualCursor<Value = Value>>(cursor: &mut C, columns: usize) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        while !cursor.at_end() {
            rows.push((0..columns).map(|i| cursor.column(i).unwrap_or_default()).collect());
            cursor.advance().expect("Could not advance");
        }
        rows
    }

    #[test]
    fn lookup() {
        let service = lookup_service(TABLE);
        let relation = relation(&service);
        let mut cursor = relation.open().expect("Could not open");
        assert_eq!(cursor.state(), CursorState::Created);
        assert!(cursor.at_end());
        assert_eq!(cursor.row_id(), 0);

        cursor
            .bind(&ArgumentOrder::Identity, &[Value::from(1)])
            .expect("Could not bind");
        assert_eq!(cursor.state(), CursorState::Iterating);
        assert_eq!(cursor.row_id(), 1);
        assert_eq!(cursor.column(0), Some(Value::from("a")));
        assert_eq!(cursor.column(1), Some(Value::from(1)));
        cursor.advance().unwrap();
        assert!(cursor.at_end());
        assert_eq!(cursor.state(), CursorState::Exhausted);

        cursor
            .bind(&ArgumentOrder::Identity, &[Value::from(3)])
            .expect("Could not bind again");
        assert!(cursor.at_end());
        assert_eq!(cursor.row_id(), 0);
        assert_eq!(cursor.column(0), None);
        assert_eq!(cursor.column(1), Some(Value::from(3)));
    }

    #[test]
    fn row_ids_increase() {
        let service = lookup_service(TABLE);
        let relation = relation(&service);
        let mut cursor = relation.open().unwrap();
        cursor.bind(&ArgumentOrder::Identity, &[2.into()]).unwrap();
        let mut ids = Vec::new();
        while !cursor.at_end() {
            ids.push(cursor.row_id());
            cursor.advance().unwrap();
        }
        assert_eq!(ids, [1, 2]);
        cursor.advance().expect("Advancing an exhausted cursor is a no-op");
        assert!(cursor.at_end());
        assert_eq!(cursor.row_id(), 2);
    }

    #[test]
    fn unbound_inputs_read_null() {
        let service = lookup_service(TABLE);
        let relation = relation(&service);
        let mut cursor = relation.open().unwrap();
        cursor.bind(&ArgumentOrder::Identity, &[]).unwrap();
        assert!(cursor.at_end());
        assert_eq!(cursor.column(1), None);
        assert_eq!(cursor.column(7), None);
    }

    #[test]
    fn mapped_arguments() {
        let service = MemoryService::default().with(
            "SELECT :a, :b, :c",
            MemoryQuery::new(
                &[("a", None), ("b", None), ("c", None)],
                &[Some(":a"), Some(":b"), Some(":c")],
                |bindings| Ok(vec![bindings.to_vec()]),
            ),
        );
        let relation = StatementRelation::declare(
            service.clone(),
            Some("(SELECT :a, :b, :c)"),
            PlanEstimates::default(),
        )
        .unwrap();
        let mut cursor = relation.open().unwrap();
        cursor
            .bind(
                &ArgumentOrder::Mapped([3, 1].into()),
                &[Value::from("third"), Value::from("first")],
            )
            .expect("Could not bind");
        let rows = collect(&mut cursor, 6);
        assert_eq!(
            rows,
            [[
                Value::from("first"),
                Value::Null,
                Value::from("third"),
                Value::from("first"),
                Value::Null,
                Value::from("third"),
            ]]
        );
    }

    #[test]
    fn too_many_arguments() {
        let service = lookup_service(TABLE);
        let relation = relation(&service);
        let mut cursor = relation.open().unwrap();
        let error = cursor
            .bind(&ArgumentOrder::Identity, &[1.into(), 2.into()])
            .expect_err("More arguments than parameters");
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::InvariantViolation(..))
        ));
        let error = cursor
            .bind(&ArgumentOrder::Mapped([2].into()), &[1.into()])
            .expect_err("Mapped to a missing parameter");
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::InvariantViolation(..))
        ));
    }

    #[test]
    fn execution_error_abandons_scan() {
        let service = MemoryService::default().with(
            "SELECT boom(:x)",
            MemoryQuery::new(&[("boom", None)], &[Some(":x")], |_| {
                Err(failing("boom exploded"))
            }),
        );
        let relation = StatementRelation::declare(
            service.clone(),
            Some("(SELECT boom(:x))"),
            PlanEstimates::default(),
        )
        .unwrap();
        let mut cursor = relation.open().unwrap();
        let error = cursor
            .bind(&ArgumentOrder::Identity, &[1.into()])
            .expect_err("Step must fail");
        assert_eq!(error.to_string(), "boom exploded");
        assert_eq!(cursor.state(), CursorState::Failed);
        assert!(cursor.advance().is_err());
        assert!(cursor.bind(&ArgumentOrder::Identity, &[1.into()]).is_err());
        cursor.close();
        assert_eq!(service.finalized(), 2);
    }

    #[test]
    fn advance_before_bind() {
        let service = lookup_service(TABLE);
        let relation = relation(&service);
        let mut cursor = relation.open().unwrap();
        assert!(cursor.advance().is_err());
    }

    #[test]
    fn close_is_idempotent() {
        let service = lookup_service(TABLE);
        let relation = relation(&service);
        assert_eq!(service.prepared(), 1);
        assert_eq!(service.finalized(), 1);
        let mut cursor = relation.open().unwrap();
        cursor.bind(&ArgumentOrder::Identity, &[1.into()]).unwrap();
        assert_eq!(service.prepared(), 2);
        cursor.close();
        assert_eq!(service.finalized(), 2);
        assert_eq!(cursor.state(), CursorState::Closed);
        assert!(cursor.at_end());
        cursor.close();
        assert_eq!(service.finalized(), 2);
        assert!(cursor.bind(&ArgumentOrder::Identity, &[1.into()]).is_err());
        drop(cursor);
        assert_eq!(service.finalized(), 2);
    }

    #[test]
    fn drop_finalizes() {
        let service = lookup_service(TABLE);
        let relation = relation(&service);
        {
            let mut cursor = relation.open().unwrap();
            cursor.bind(&ArgumentOrder::Identity, &[2.into()]).unwrap();
        }
        assert_eq!(service.prepared(), 2);
        assert_eq!(service.finalized(), 2);
    }

    #[test]
    fn concurrent_cursors() {
        let service = lookup_service(TABLE);
        let relation = relation(&service);
        let mut first = relation.open().unwrap();
        let mut second = relation.open().unwrap();
        first.bind(&ArgumentOrder::Identity, &[2.into()]).unwrap();
        second.bind(&ArgumentOrder::Identity, &[1.into()]).unwrap();
        assert_eq!(first.column(0), Some("b".into()));
        assert_eq!(second.column(0), Some("a".into()));
        second.advance().unwrap();
        assert!(second.at_end());
        assert!(!first.at_end());
        assert_eq!(first.column(1), Some(2.into()));
        first.advance().unwrap();
        assert_eq!(first.column(0), Some("c".into()));
        assert_eq!(first.row_id(), 2);
        assert_eq!(second.column(1), Some(1.into()));
    }
}
