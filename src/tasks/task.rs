// src/tasks/task.rs

use std::fmt;

use blake3::Hasher;

/// Canonical handler name type used throughout the engine.
pub type HandlerName = String;

/// One positional argument of a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskArg {
    Str(String),
    Num(i64),
    List(Vec<String>),
}

impl TaskArg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TaskArg::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            TaskArg::List(l) => Some(l),
            _ => None,
        }
    }

    fn hash_into(&self, hasher: &mut Hasher) {
        match self {
            TaskArg::Str(s) => {
                hasher.update(b"s");
                update_len_prefixed(hasher, s.as_bytes());
            }
            TaskArg::Num(n) => {
                hasher.update(b"n");
                hasher.update(&n.to_le_bytes());
            }
            TaskArg::List(items) => {
                hasher.update(b"l");
                hasher.update(&(items.len() as u64).to_le_bytes());
                for item in items {
                    update_len_prefixed(hasher, item.as_bytes());
                }
            }
        }
    }
}

impl fmt::Display for TaskArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskArg::Str(s) => write!(f, "{s:?}"),
            TaskArg::Num(n) => write!(f, "{n}"),
            TaskArg::List(items) => write!(f, "{items:?}"),
        }
    }
}

impl From<&str> for TaskArg {
    fn from(s: &str) -> Self {
        TaskArg::Str(s.to_string())
    }
}

impl From<String> for TaskArg {
    fn from(s: String) -> Self {
        TaskArg::Str(s)
    }
}

impl From<i64> for TaskArg {
    fn from(n: i64) -> Self {
        TaskArg::Num(n)
    }
}

impl From<Vec<String>> for TaskArg {
    fn from(items: Vec<String>) -> Self {
        TaskArg::List(items)
    }
}

fn update_len_prefixed(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Deduplication identity of a task, derived from `(handler, args)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(blake3::Hash);

impl TaskId {
    pub fn derive(handler: &str, args: &[TaskArg]) -> Self {
        let mut hasher = Hasher::new();
        update_len_prefixed(&mut hasher, handler.as_bytes());
        hasher.update(&(args.len() as u64).to_le_bytes());
        for arg in args {
            arg.hash_into(&mut hasher);
        }
        TaskId(hasher.finalize())
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({self})")
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.0.to_hex();
        f.write_str(&hex[..12])
    }
}

/// An immutable unit of deferred work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    handler: HandlerName,
    args: Vec<TaskArg>,
    id: TaskId,
}

impl Task {
    pub fn new(handler: impl Into<HandlerName>, args: Vec<TaskArg>) -> Self {
        let handler = handler.into();
        let id = TaskId::derive(&handler, &args);
        Self { handler, args, id }
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn args(&self) -> &[TaskArg] {
        &self.args
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Human-readable `handler(arg, ...)` form for logs and failure reports.
    pub fn describe(&self) -> String {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        format!("{}({})", self.handler, args.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_depends_on_handler_and_args() {
        let a = Task::new("copy", vec!["a.png".into(), "out/a.png".into()]);
        let b = Task::new("copy", vec!["a.png".into(), "out/a.png".into()]);
        let c = Task::new("copy", vec!["b.png".into(), "out/a.png".into()]);
        let d = Task::new("reload", vec!["a.png".into(), "out/a.png".into()]);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_ne!(a.id(), d.id());
    }

    #[test]
    fn identity_is_not_fooled_by_concatenation() {
        let a = Task::new("x", vec!["ab".into(), "c".into()]);
        let b = Task::new("x", vec!["a".into(), "bc".into()]);
        assert_ne!(a.id(), b.id());

        let list = Task::new("x", vec![TaskArg::List(vec!["a".into(), "b".into()])]);
        let strs = Task::new("x", vec!["a".into(), "b".into()]);
        assert_ne!(list.id(), strs.id());
    }

    #[test]
    fn describe_is_readable() {
        let t = Task::new("command", vec!["tsc".into(), TaskArg::Num(3)]);
        assert_eq!(t.describe(), "command(\"tsc\", 3)");
    }
}
