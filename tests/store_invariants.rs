//! Property tests: random operation sequences never break the store.
//!
//! After every step the store must report no invariant violations, every
//! list's `tasks_count` must match a brute-force count, and index-backed
//! queries must agree with a linear scan.

mod common;

use chrono::{DateTime, Duration, Utc};
use common::{assert_consistent, base_time, ticking_store};
use proptest::prelude::*;
use std::collections::HashSet;
use taskdeck::model::{ListPatch, NewList, NewTask, Priority, Status, TaskPatch};
use taskdeck::query::{PageRequest, SortSpec, TaskFilters};
use taskdeck::{StoreError, TaskStore};

#[derive(Debug, Clone)]
enum Op {
    CreateList(u8),
    RenameList(usize, u8),
    DeleteList(usize, bool),
    CreateTask {
        list: usize,
        priority: Priority,
        status: Status,
        deadline: Option<i64>,
    },
    UpdateTask {
        task: usize,
        move_to: Option<usize>,
        priority: Option<Priority>,
        status: Option<Status>,
        deadline: Option<Option<i64>>,
    },
    ToggleTask(usize),
    DeleteTask(usize),
}

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

fn status() -> impl Strategy<Value = Status> {
    prop_oneof![Just(Status::Pending), Just(Status::Completed)]
}

/// Deadline offsets in hours, spanning a few weeks around the base time.
fn deadline_offset() -> impl Strategy<Value = i64> {
    -500i64..500
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => (0u8..6).prop_map(Op::CreateList),
        1 => (any::<usize>(), 0u8..6).prop_map(|(i, n)| Op::RenameList(i, n)),
        1 => (any::<usize>(), any::<bool>()).prop_map(|(i, c)| Op::DeleteList(i, c)),
        5 => (any::<usize>(), priority(), status(), proptest::option::of(deadline_offset()))
            .prop_map(|(list, priority, status, deadline)| Op::CreateTask {
                list,
                priority,
                status,
                deadline,
            }),
        4 => (
            any::<usize>(),
            proptest::option::of(any::<usize>()),
            proptest::option::of(priority()),
            proptest::option::of(status()),
            proptest::option::of(proptest::option::of(deadline_offset())),
        )
            .prop_map(|(task, move_to, priority, status, deadline)| Op::UpdateTask {
                task,
                move_to,
                priority,
                status,
                deadline,
            }),
        2 => any::<usize>().prop_map(Op::ToggleTask),
        2 => any::<usize>().prop_map(Op::DeleteTask),
    ]
}

fn at(offset_hours: i64) -> DateTime<Utc> {
    base_time() + Duration::hours(offset_hours)
}

fn pick(ids: &[String], i: usize) -> Option<String> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[i % ids.len()].clone())
    }
}

fn apply(store: &TaskStore, op: &Op) {
    let list_ids: Vec<String> = store.all_lists().into_iter().map(|l| l.id).collect();
    let task_ids: Vec<String> = store.all_tasks().into_iter().map(|t| t.id).collect();

    let result = match op {
        Op::CreateList(n) => store.create_list(NewList::named(format!("list-{n}"))).map(drop),
        Op::RenameList(i, n) => match pick(&list_ids, *i) {
            Some(id) => store
                .update_list(
                    &id,
                    &ListPatch {
                        name: Some(format!("LIST-{n}")),
                        ..ListPatch::default()
                    },
                )
                .map(drop),
            None => Ok(()),
        },
        Op::DeleteList(i, cascade) => match pick(&list_ids, *i) {
            Some(id) => store.delete_list(&id, *cascade).map(drop),
            None => Ok(()),
        },
        Op::CreateTask {
            list,
            priority,
            status,
            deadline,
        } => {
            let list_id = pick(&list_ids, *list).unwrap_or_else(|| "missing".to_string());
            let mut new = NewTask::new(list_id, "task")
                .with_priority(*priority)
                .with_status(*status);
            new.deadline = deadline.map(at);
            store.create_task(new).map(drop)
        }
        Op::UpdateTask {
            task,
            move_to,
            priority,
            status,
            deadline,
        } => match pick(&task_ids, *task) {
            Some(id) => {
                let patch = TaskPatch {
                    list_id: move_to.and_then(|i| pick(&list_ids, i)),
                    priority: *priority,
                    status: *status,
                    deadline: deadline.map(|d| d.map(at)),
                    ..TaskPatch::default()
                };
                store.update_task(&id, &patch).map(drop)
            }
            None => Ok(()),
        },
        Op::ToggleTask(i) => match pick(&task_ids, *i) {
            Some(id) => store.toggle_task(&id).map(drop),
            None => Ok(()),
        },
        Op::DeleteTask(i) => match pick(&task_ids, *i) {
            Some(id) => store.delete_task(&id).map(drop),
            None => Ok(()),
        },
    };

    // Expected rejections: duplicate names, non-empty list without cascade,
    // missing list, full store. Anything else is a bug.
    if let Err(err) = result {
        assert!(
            matches!(
                err,
                StoreError::Conflict { .. }
                    | StoreError::InvalidState { .. }
                    | StoreError::NotFound { .. }
                    | StoreError::CapacityExceeded { .. }
            ),
            "unexpected error for {op:?}: {err}"
        );
    }
}

fn check_against_scan(store: &TaskStore) {
    let tasks = store.all_tasks();
    let lists = store.all_lists();

    for list in &lists {
        let live = tasks.iter().filter(|t| t.list_id == list.id).count();
        assert_eq!(list.tasks_count, live, "tasks_count for {}", list.name);
    }
    for task in &tasks {
        assert!(lists.iter().any(|l| l.id == task.list_id), "dangling task");
        assert_eq!(task.completed_at.is_some(), task.status == Status::Completed);
    }

    for status in Status::ALL {
        let filters = TaskFilters {
            status: Some(status),
            ..TaskFilters::default()
        };
        let page = store.query_tasks(&filters, SortSpec::default(), PageRequest::first_max());
        let expected: HashSet<&str> = tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(page.total, expected.len());
        for task in &page.items {
            assert!(expected.contains(task.id.as_str()));
            assert_eq!(task.status, status);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operations_preserve_invariants(ops in prop::collection::vec(op(), 1..60)) {
        let store = ticking_store(40);
        for op in &ops {
            apply(&store, op);
            assert_consistent(&store);
            check_against_scan(&store);
            prop_assert!(store.len() <= 40);
        }
    }

    #[test]
    fn deadline_range_matches_brute_force(
        offsets in prop::collection::vec(proptest::option::of(-400i64..400), 0..40),
        a in -20i64..20,
        width in 0i64..20,
    ) {
        let store = ticking_store(1000);
        let list = store.create_list(NewList::named("Range")).unwrap();
        for offset in &offsets {
            let mut new = NewTask::new(&list.id, "t");
            new.deadline = offset.map(at);
            store.create_task(new).unwrap();
        }

        let from = (base_time() + Duration::days(a)).date_naive();
        let to = (base_time() + Duration::days(a + width)).date_naive();

        let got: HashSet<String> = store
            .tasks_in_deadline_range(from, to)
            .into_iter()
            .map(|t| t.id)
            .collect();
        let expected: HashSet<String> = store
            .all_tasks()
            .into_iter()
            .filter(|t| {
                t.deadline
                    .map(|d| d.date_naive())
                    .is_some_and(|day| from <= day && day <= to)
            })
            .map(|t| t.id)
            .collect();
        prop_assert_eq!(got, expected);
    }
}

#[test]
fn boundary_days_are_included() {
    let store = ticking_store(100);
    let list = store.create_list(NewList::named("Edges")).unwrap();
    let from = base_time();
    let to = base_time() + Duration::days(6);

    let on_from = store
        .create_task(NewTask::new(&list.id, "start").with_deadline(from))
        .unwrap();
    let on_to = store
        .create_task(NewTask::new(&list.id, "end").with_deadline(to))
        .unwrap();
    store
        .create_task(NewTask::new(&list.id, "before").with_deadline(from - Duration::days(1)))
        .unwrap();
    store
        .create_task(NewTask::new(&list.id, "after").with_deadline(to + Duration::days(1)))
        .unwrap();

    let ids: Vec<String> = store
        .tasks_in_deadline_range(from.date_naive(), to.date_naive())
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![on_from.id, on_to.id]);
}

#[test]
fn moving_a_task_updates_both_lists() {
    let store = ticking_store(100);
    let work = store.create_list(NewList::named("Work")).unwrap();
    let home = store.create_list(NewList::named("Home")).unwrap();
    let task = store.create_task(NewTask::new(&work.id, "move me")).unwrap();

    let patch = TaskPatch {
        list_id: Some(home.id.clone()),
        ..TaskPatch::default()
    };
    store.update_task(&task.id, &patch).unwrap();

    assert_eq!(store.get_list(&work.id).unwrap().tasks_count, 0);
    assert_eq!(store.get_list(&home.id).unwrap().tasks_count, 1);
    let in_work = store.query_tasks(
        &TaskFilters::in_list(&work.id),
        SortSpec::default(),
        PageRequest::default(),
    );
    assert_eq!(in_work.total, 0);
    assert_consistent(&store);
}

#[test]
fn status_index_never_holds_stale_entries() {
    let store = ticking_store(100);
    let list = store.create_list(NewList::named("Work")).unwrap();
    let task = store.create_task(NewTask::new(&list.id, "flip")).unwrap();

    for _ in 0..5 {
        store.toggle_task(&task.id).unwrap();
        let current = store.get_task(&task.id).unwrap().status;
        for status in Status::ALL {
            let filters = TaskFilters {
                status: Some(status),
                ..TaskFilters::default()
            };
            let page = store.query_tasks(&filters, SortSpec::default(), PageRequest::default());
            assert_eq!(page.total, usize::from(status == current));
        }
    }

    store.delete_task(&task.id).unwrap();
    let stats = store.stats();
    assert_eq!(stats.pending + stats.completed, 0);
    assert_eq!(stats.index_buckets, 0);
    assert_consistent(&store);
}
