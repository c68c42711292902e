//! File-based task graph and incremental scheduler
//!
//! Rules are declared up front; [`TaskGraph::invoke`] then walks the
//! prerequisites of the requested target depth-first, in declared order, and
//! runs an action only when its target is stale. A file target is stale when
//! it is missing or strictly older than its newest prerequisite. Directory
//! prerequisites only gate ordering.
use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Work performed for a target: receives the target and its prerequisites
pub type Action = Box<dyn Fn(&Path, &[PathBuf]) -> BuildResult<()>>;

/// Computes the prerequisites of a pattern-rule target
pub type PrerequisiteResolver = Box<dyn Fn(&Path) -> Vec<PathBuf>>;

/// Prerequisites of a file rule
pub enum Prerequisites {
    /// Known at declaration time
    Static(Vec<PathBuf>),
    /// Computed when the rule is evaluated
    Deferred(Box<dyn Fn() -> BuildResult<Vec<PathBuf>>>),
}

impl Prerequisites {
    /// Defer computation of the prerequisite list until evaluation
    pub fn deferred(f: impl Fn() -> BuildResult<Vec<PathBuf>> + 'static) -> Self {
        Self::Deferred(Box::new(f))
    }

    fn resolve(&self) -> BuildResult<Vec<PathBuf>> {
        match self {
            Self::Static(paths) => Ok(paths.clone()),
            Self::Deferred(f) => f(),
        }
    }
}

impl From<Vec<PathBuf>> for Prerequisites {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::Static(paths)
    }
}

/// Something a named task depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Another named task
    Task(String),
    /// A file or directory target
    File(PathBuf),
}

struct FileRule {
    prerequisites: Prerequisites,
    action: Action,
}

struct PatternRule {
    suffix: String,
    resolver: PrerequisiteResolver,
    action: Action,
}

struct TaskRule {
    description: Option<String>,
    dependencies: Vec<Dependency>,
    action: Option<Action>,
}

/// Outcome of one [`TaskGraph::invoke`] call
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Targets whose action ran, in execution order
    pub executed: Vec<String>,
    /// Targets found up to date
    pub up_to_date: usize,
    /// Wall time of the invocation
    pub elapsed: Duration,
}

impl BuildReport {
    /// Whether nothing had to be done
    pub fn is_noop(&self) -> bool {
        self.executed.is_empty()
    }
}

/// State owned by a single invocation
#[derive(Default)]
struct Run {
    built_files: HashSet<PathBuf>,
    built_tasks: HashSet<String>,
    stack: Vec<String>,
    report: BuildReport,
}

impl Run {
    fn enter(&mut self, name: String) -> BuildResult<()> {
        if let Some(start) = self.stack.iter().position(|n| *n == name) {
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(name);
            return Err(BuildError::CircularDependency(cycle.join(" -> ")));
        }
        self.stack.push(name);
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }
}

/// Rule table plus the scheduler that evaluates it
#[derive(Default)]
pub struct TaskGraph {
    files: HashMap<PathBuf, FileRule>,
    directories: HashSet<PathBuf>,
    patterns: Vec<PatternRule>,
    tasks: HashMap<String, TaskRule>,
    task_order: Vec<String>,
}

impl TaskGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a file target built by `action` from `prerequisites`
    pub fn file(
        &mut self,
        target: impl Into<PathBuf>,
        prerequisites: impl Into<Prerequisites>,
        action: impl Fn(&Path, &[PathBuf]) -> BuildResult<()> + 'static,
    ) {
        self.files.insert(
            target.into(),
            FileRule {
                prerequisites: prerequisites.into(),
                action: Box::new(action),
            },
        );
    }

    /// Declare a directory created on demand
    pub fn directory(&mut self, path: impl Into<PathBuf>) {
        self.directories.insert(path.into());
    }

    /// Declare a rule for any target whose path ends with `suffix`
    pub fn rule(
        &mut self,
        suffix: impl Into<String>,
        resolver: impl Fn(&Path) -> Vec<PathBuf> + 'static,
        action: impl Fn(&Path, &[PathBuf]) -> BuildResult<()> + 'static,
    ) {
        self.patterns.push(PatternRule {
            suffix: suffix.into(),
            resolver: Box::new(resolver),
            action: Box::new(action),
        });
    }

    /// Declare a named task
    ///
    /// Tasks are not files: their action runs every time they are invoked,
    /// after their dependencies.
    pub fn task(
        &mut self,
        name: impl Into<String>,
        description: Option<&str>,
        dependencies: Vec<Dependency>,
        action: Option<Action>,
    ) {
        let name = name.into();
        if !self.tasks.contains_key(&name) {
            self.task_order.push(name.clone());
        }
        self.tasks.insert(
            name,
            TaskRule {
                description: description.map(str::to_string),
                dependencies,
                action,
            },
        );
    }

    /// Named tasks with their descriptions, in declaration order
    pub fn task_descriptions(&self) -> Vec<(&str, Option<&str>)> {
        self.task_order
            .iter()
            .filter_map(|name| {
                self.tasks
                    .get(name)
                    .map(|task| (name.as_str(), task.description.as_deref()))
            })
            .collect()
    }

    /// Bring a task or file target up to date
    ///
    /// Task names are looked up first, then file targets. The first failing
    /// action aborts the invocation.
    pub fn invoke(&self, name: &str) -> BuildResult<BuildReport> {
        let start = Instant::now();
        let mut run = Run::default();

        if self.tasks.contains_key(name) {
            self.run_task(name, &mut run)?;
        } else {
            self.make(Path::new(name), &mut run)?;
        }

        run.report.elapsed = start.elapsed();
        Ok(run.report)
    }

    fn run_task(&self, name: &str, run: &mut Run) -> BuildResult<()> {
        if run.built_tasks.contains(name) {
            return Ok(());
        }
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| BuildError::no_rule(name))?;

        run.enter(name.to_string())?;
        let mut files = Vec::new();
        for dependency in &task.dependencies {
            match dependency {
                Dependency::Task(dep) => self.run_task(dep, run)?,
                Dependency::File(path) => {
                    self.make(path, run)?;
                    files.push(path.clone());
                }
            }
        }
        if let Some(action) = &task.action {
            log::debug!("running task {}", name);
            action(Path::new(name), &files)?;
            run.report.executed.push(name.to_string());
        }
        run.leave();

        run.built_tasks.insert(name.to_string());
        Ok(())
    }

    fn make(&self, target: &Path, run: &mut Run) -> BuildResult<()> {
        if run.built_files.contains(target) {
            return Ok(());
        }
        run.enter(target.display().to_string())?;

        if let Some(rule) = self.files.get(target) {
            let prerequisites = rule.prerequisites.resolve()?;
            self.freshen(target, &prerequisites, &rule.action, run)?;
        } else if self.directories.contains(target) {
            if target.is_dir() {
                run.report.up_to_date += 1;
            } else {
                log::debug!("mkdir -p {}", target.display());
                fs::create_dir_all(target).map_err(|e| BuildError::io(target, e))?;
                run.report.executed.push(target.display().to_string());
            }
        } else if let Some(rule) = self.pattern_for(target) {
            let prerequisites = (rule.resolver)(target);
            self.freshen(target, &prerequisites, &rule.action, run)?;
        } else if !target.exists() {
            return Err(BuildError::no_rule(target));
        }

        run.leave();
        run.built_files.insert(target.to_path_buf());
        Ok(())
    }

    fn freshen(
        &self,
        target: &Path,
        prerequisites: &[PathBuf],
        action: &Action,
        run: &mut Run,
    ) -> BuildResult<()> {
        for prerequisite in prerequisites {
            self.make(prerequisite, run)?;
        }

        if is_stale(target, prerequisites)? {
            action(target, prerequisites)?;
            run.report.executed.push(target.display().to_string());
        } else {
            log::debug!("{} is up to date", target.display());
            run.report.up_to_date += 1;
        }
        Ok(())
    }

    /// Pattern rule with the longest matching suffix
    fn pattern_for(&self, target: &Path) -> Option<&PatternRule> {
        let name = target.to_string_lossy();
        self.patterns
            .iter()
            .filter(|rule| name.ends_with(rule.suffix.as_str()))
            .max_by_key(|rule| rule.suffix.len())
    }
}

/// Missing, or strictly older than the newest non-directory prerequisite
///
/// A missing prerequisite makes the target stale.
pub fn is_stale(target: &Path, prerequisites: &[PathBuf]) -> BuildResult<bool> {
    let target_time = match modified(target)? {
        Some(time) => time,
        None => return Ok(true),
    };

    for prerequisite in prerequisites {
        let metadata = match fs::metadata(prerequisite) {
            Ok(metadata) => metadata,
            // A prerequisite whose action left nothing behind counts as newest
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(BuildError::io(prerequisite, e)),
        };
        if metadata.is_dir() {
            continue;
        }
        let time = metadata
            .modified()
            .map_err(|e| BuildError::io(prerequisite, e))?;
        if time > target_time {
            return Ok(true);
        }
    }
    Ok(false)
}

fn modified(path: &Path) -> BuildResult<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(metadata) => metadata
            .modified()
            .map(Some)
            .map_err(|e| BuildError::io(path, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BuildError::io(path, e)),
    }
}
