use std::sync::Arc;

use tempfile::TempDir;

use super::Database;
use crate::execution::testing::{collect, multiset, VecIterator};
use crate::execution::{
    Aggregate, AggregateOp, Delete, ExecError, Filter, Insert, Join, JoinPredicate, Op,
    OpIterator, Predicate, SeqScan,
};
use crate::storage::{HeapFile, HeapPage, PageId};
use crate::transaction::TransactionId;
use crate::tuple::{Field, FieldType, Tuple, TupleDesc};

fn setup() -> (TempDir, Database) {
    (tempfile::tempdir().unwrap(), Database::new())
}

fn create_table(
    db: &Database,
    dir: &TempDir,
    name: &str,
    types: Vec<FieldType>,
    field_names: &[&str],
) -> i32 {
    let desc = Arc::new(TupleDesc::new(
        types,
        field_names.iter().map(|n| Some(n.to_string())).collect(),
    ));
    let file =
        Arc::new(HeapFile::open(dir.path().join(format!("{}.dat", name)), desc).unwrap());
    let id = file.id();
    db.catalog().add_table(file, name, field_names[0]);
    id
}

fn fill(db: &Database, tid: TransactionId, table_id: i32, rows: Vec<Vec<Field>>) {
    let desc = db.catalog().tuple_desc(table_id).unwrap();
    for fields in rows {
        let tuple = Tuple::new(desc.clone(), fields).unwrap();
        db.buffer_pool().insert_tuple(tid, table_id, tuple).unwrap();
    }
}

#[test]
fn test_scan_round_trips_through_disk() {
    let (dir, db) = setup();
    let tid = TransactionId::new();
    let table = create_table(
        &db,
        &dir,
        "t",
        vec![FieldType::Int, FieldType::Str],
        &["a", "b"],
    );
    fill(
        &db,
        tid,
        table,
        vec![
            vec![Field::Int(1), Field::Str("a".to_string())],
            vec![Field::Int(2), Field::Str("bb".to_string())],
            vec![Field::Int(3), Field::Str(String::new())],
        ],
    );

    // Push the rows all the way to disk, then read them back cold
    db.buffer_pool().flush_all_pages().unwrap();
    let file = db.catalog().file(table).unwrap();
    let page = file.read_page(PageId::new(table, 0)).unwrap();
    let slots: Vec<_> = page.iter().map(|t| t.record_id().unwrap().slot_id).collect();
    assert_eq!(slots, vec![0, 1, 2]);

    let mut scan = SeqScan::new(&db, tid, table).unwrap();
    scan.open().unwrap();
    let out = collect(&mut scan).unwrap();
    scan.close();
    assert_eq!(
        multiset(&out),
        multiset(&[
            Tuple::new(
                file.tuple_desc().clone(),
                vec![Field::Int(1), Field::Str("a".to_string())]
            )
            .unwrap(),
            Tuple::new(
                file.tuple_desc().clone(),
                vec![Field::Int(2), Field::Str("bb".to_string())]
            )
            .unwrap(),
            Tuple::new(
                file.tuple_desc().clone(),
                vec![Field::Int(3), Field::Str(String::new())]
            )
            .unwrap(),
        ])
    );
}

#[test]
fn test_bulk_insert_grows_file_to_expected_pages() {
    let (dir, db) = setup();
    let tid = TransactionId::new();
    let table = create_table(&db, &dir, "t", vec![FieldType::Int], &["a"]);
    let desc = db.catalog().tuple_desc(table).unwrap();

    const ROWS: usize = 10_000;
    for v in 0..ROWS {
        let tuple = Tuple::new(desc.clone(), vec![Field::Int(v as i32)]).unwrap();
        db.buffer_pool().insert_tuple(tid, table, tuple).unwrap();
    }

    // 992 single-INT slots per page: 10000 rows need ceil(10000 / 992) = 11
    assert_eq!(HeapPage::slots_per_page(&desc), 992);
    let file = db.catalog().file(table).unwrap();
    assert_eq!(file.num_pages().unwrap(), 11);

    let mut scan = SeqScan::new(&db, tid, table).unwrap();
    scan.open().unwrap();
    let mut seen: Vec<i32> = Vec::with_capacity(ROWS);
    while scan.has_next().unwrap() {
        match scan.next().unwrap().field(0) {
            Some(Field::Int(v)) => seen.push(*v),
            other => panic!("unexpected field {:?}", other),
        }
    }
    scan.close();
    seen.sort_unstable();
    assert_eq!(seen, (0..ROWS as i32).collect::<Vec<_>>());
}

#[test]
fn test_pool_eviction_keeps_recently_used_pages() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::with_pool_capacity(3);
    let tid = TransactionId::new();
    let table = create_table(&db, &dir, "t", vec![FieldType::Int], &["a"]);

    // Write four pages directly through the file
    let file = db.catalog().file(table).unwrap();
    for page_no in 0..4 {
        let pid = PageId::new(table, page_no);
        let mut page = HeapPage::empty(pid, file.tuple_desc().clone()).unwrap();
        page.insert_tuple(
            Tuple::new(file.tuple_desc().clone(), vec![Field::Int(page_no as i32)]).unwrap(),
        )
        .unwrap();
        file.write_page(&page).unwrap();
    }

    for page_no in [0, 1, 2, 0, 3] {
        db.buffer_pool()
            .get_page(
                tid,
                PageId::new(table, page_no),
                crate::transaction::Permissions::ReadOnly,
            )
            .unwrap();
    }

    let pool = db.buffer_pool();
    assert!(pool.is_page_cached(PageId::new(table, 0)));
    assert!(!pool.is_page_cached(PageId::new(table, 1)));
    assert!(pool.is_page_cached(PageId::new(table, 2)));
    assert!(pool.is_page_cached(PageId::new(table, 3)));
    assert_eq!(pool.len(), 3);
}

#[test]
fn test_filter_over_scan() {
    let (dir, db) = setup();
    let tid = TransactionId::new();
    let table = create_table(
        &db,
        &dir,
        "t",
        vec![FieldType::Int, FieldType::Str],
        &["a", "b"],
    );
    fill(
        &db,
        tid,
        table,
        vec![
            vec![Field::Int(1), Field::Str("x".to_string())],
            vec![Field::Int(2), Field::Str("y".to_string())],
            vec![Field::Int(3), Field::Str("x".to_string())],
        ],
    );

    let scan = SeqScan::new(&db, tid, table).unwrap();
    let mut filter = Filter::new(
        Predicate::new(0, Op::GreaterThan, Field::Int(1)),
        Box::new(scan),
    );
    filter.open().unwrap();
    let out = collect(&mut filter).unwrap();
    filter.close();

    let expected = vec![
        vec![Field::Int(2), Field::Str("y".to_string())],
        vec![Field::Int(3), Field::Str("x".to_string())],
    ];
    assert_eq!(multiset(&out), expected);
}

#[test]
fn test_nested_loops_join_over_scans() {
    let (dir, db) = setup();
    let tid = TransactionId::new();
    let left = create_table(&db, &dir, "left", vec![FieldType::Int], &["a"]);
    let right = create_table(&db, &dir, "right", vec![FieldType::Int], &["b"]);
    fill(
        &db,
        tid,
        left,
        vec![
            vec![Field::Int(1)],
            vec![Field::Int(2)],
            vec![Field::Int(3)],
        ],
    );
    fill(
        &db,
        tid,
        right,
        vec![
            vec![Field::Int(2)],
            vec![Field::Int(2)],
            vec![Field::Int(4)],
        ],
    );

    let mut join = Join::new(
        JoinPredicate::new(0, Op::Equals, 0),
        Box::new(SeqScan::new(&db, tid, left).unwrap()),
        Box::new(SeqScan::new(&db, tid, right).unwrap()),
    );
    join.open().unwrap();
    let out = collect(&mut join).unwrap();
    join.close();

    let expected = vec![
        vec![Field::Int(2), Field::Int(2)],
        vec![Field::Int(2), Field::Int(2)],
    ];
    assert_eq!(multiset(&out), expected);
}

#[test]
fn test_grouped_sum_over_scan() {
    let (dir, db) = setup();
    let tid = TransactionId::new();
    let table = create_table(
        &db,
        &dir,
        "t",
        vec![FieldType::Str, FieldType::Int],
        &["g", "v"],
    );
    fill(
        &db,
        tid,
        table,
        vec![
            vec![Field::Str("A".to_string()), Field::Int(1)],
            vec![Field::Str("A".to_string()), Field::Int(2)],
            vec![Field::Str("B".to_string()), Field::Int(5)],
        ],
    );

    let mut agg = Aggregate::new(
        Box::new(SeqScan::new(&db, tid, table).unwrap()),
        1,
        Some((0, FieldType::Str)),
        AggregateOp::Sum,
    );
    agg.open().unwrap();
    let out = collect(&mut agg).unwrap();
    agg.close();

    let expected = vec![
        vec![Field::Str("A".to_string()), Field::Int(3)],
        vec![Field::Str("B".to_string()), Field::Int(5)],
    ];
    assert_eq!(multiset(&out), expected);
    assert_eq!(out[0].desc().field_type(0), Some(FieldType::Str));
    assert_eq!(out[0].desc().field_type(1), Some(FieldType::Int));
}

#[test]
fn test_insert_operator_reports_count_once() {
    let (dir, db) = setup();
    let tid = TransactionId::new();
    let table = create_table(&db, &dir, "t", vec![FieldType::Int], &["a"]);
    let desc = db.catalog().tuple_desc(table).unwrap();

    let rows: Vec<Tuple> = (0..7)
        .map(|v| Tuple::new(desc.clone(), vec![Field::Int(v)]).unwrap())
        .collect();
    let child = VecIterator::new(desc, rows);
    let mut insert = Insert::new(&db, tid, Box::new(child), table).unwrap();

    insert.open().unwrap();
    assert!(insert.has_next().unwrap());
    assert_eq!(insert.next().unwrap().fields(), &[Field::Int(7)]);
    assert!(!insert.has_next().unwrap());
    assert!(matches!(insert.next(), Err(ExecError::NoSuchElement)));
    insert.close();

    let mut scan = SeqScan::new(&db, tid, table).unwrap();
    scan.open().unwrap();
    assert_eq!(collect(&mut scan).unwrap().len(), 7);
}

#[test]
fn test_insert_rejects_mismatched_child() {
    let (dir, db) = setup();
    let tid = TransactionId::new();
    let table = create_table(&db, &dir, "t", vec![FieldType::Int], &["a"]);

    let other = Arc::new(TupleDesc::unnamed(vec![FieldType::Str]));
    let child = VecIterator::new(other, Vec::new());
    assert!(matches!(
        Insert::new(&db, tid, Box::new(child), table),
        Err(ExecError::IllegalArgument(_))
    ));
}

#[test]
fn test_delete_operator_removes_filtered_rows() {
    let (dir, db) = setup();
    let tid = TransactionId::new();
    let table = create_table(&db, &dir, "t", vec![FieldType::Int], &["a"]);
    fill(
        &db,
        tid,
        table,
        (0..10).map(|v| vec![Field::Int(v)]).collect(),
    );

    // DELETE FROM t WHERE a >= 5
    let scan = SeqScan::new(&db, tid, table).unwrap();
    let filter = Filter::new(
        Predicate::new(0, Op::GreaterThanOrEq, Field::Int(5)),
        Box::new(scan),
    );
    let mut delete = Delete::new(&db, tid, Box::new(filter));
    delete.open().unwrap();
    assert_eq!(delete.next().unwrap().fields(), &[Field::Int(5)]);
    delete.close();

    let mut scan = SeqScan::new(&db, tid, table).unwrap();
    scan.open().unwrap();
    let remaining = collect(&mut scan).unwrap();
    scan.close();
    let expected: Vec<Vec<Field>> = (0..5).map(|v| vec![Field::Int(v)]).collect();
    assert_eq!(multiset(&remaining), expected);
}

#[test]
fn test_plan_survives_rewind_after_mutation() {
    let (dir, db) = setup();
    let tid = TransactionId::new();
    let table = create_table(&db, &dir, "t", vec![FieldType::Int], &["a"]);
    fill(&db, tid, table, (0..3).map(|v| vec![Field::Int(v)]).collect());

    let mut scan = SeqScan::new(&db, tid, table).unwrap();
    scan.open().unwrap();
    assert_eq!(collect(&mut scan).unwrap().len(), 3);

    fill(&db, tid, table, vec![vec![Field::Int(99)]]);
    scan.rewind().unwrap();
    assert_eq!(collect(&mut scan).unwrap().len(), 4);
    scan.close();
}

#[test]
fn test_global_database_reset() {
    let dir = tempfile::tempdir().unwrap();
    let before = Database::global();
    create_table(&before, &dir, "t", vec![FieldType::Int], &["a"]);
    assert_eq!(before.catalog().table_ids().count(), 1);

    Database::reset();
    let after = Database::global();
    assert_eq!(after.catalog().table_ids().count(), 0);
}
