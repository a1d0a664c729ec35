#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use taskdeck::TaskStore;
use taskdeck::model::{List, NewList, NewTask, Priority, Status, Task};

pub fn list(store: &TaskStore, name: &str) -> List {
    store.create_list(NewList::named(name)).expect("create list")
}

pub fn task(store: &TaskStore, list_id: &str, title: &str) -> Task {
    store
        .create_task(NewTask::new(list_id, title))
        .expect("create task")
}

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// Builder for task creation requests.
pub struct TaskBuilder {
    new: NewTask,
}

impl TaskBuilder {
    pub fn new(list_id: &str, title: &str) -> Self {
        Self {
            new: NewTask::new(list_id, title),
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.new.priority = priority;
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.new.deadline = Some(deadline);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.new.status = status;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.new.description = Some(description.to_string());
        self
    }

    pub fn build(self) -> NewTask {
        self.new
    }

    pub fn create(self, store: &TaskStore) -> Task {
        store.create_task(self.new).expect("create task")
    }
}
