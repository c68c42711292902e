//! Firmware build pipeline
//!
//! Declares the fixed rule set on a [`TaskGraph`]:
//!
//! ```text
//! build/<lib>/*.o  <- library sources          (.o pattern rule)
//! build/*.o        <- project sources          (.o pattern rule)
//! build/libcore.a  <- every library object
//! build/main.elf   <- project objects + archive
//! build/main.hex   <- build/main.elf           (size report, then objcopy)
//! ```
//!
//! plus the `hex`, `install` and `clean` tasks.

use crate::config::BuildConfig;
use crate::error::{BuildError, BuildResult};
use crate::graph::{Action, BuildReport, Dependency, Prerequisites, TaskGraph};
use crate::resolver::PathResolver;
use crate::targets::Target;
use crate::toolchain::{Flags, Toolchain};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Rule graph for one project, bound to a toolchain
pub struct Pipeline {
    config: Rc<BuildConfig>,
    graph: TaskGraph,
}

impl Pipeline {
    /// Declare every rule for `config`
    ///
    /// Nothing touches the filesystem until a target is invoked.
    pub fn new(config: BuildConfig, toolchain: Rc<dyn Toolchain>) -> Self {
        let config = Rc::new(config);
        let resolver = Rc::new(PathResolver::new(&config));
        let mut graph = TaskGraph::new();

        declare_objects(&mut graph, &config, &resolver, &toolchain);
        declare_archive(&mut graph, &config, &resolver, &toolchain);
        declare_image(&mut graph, &config, &resolver, &toolchain);
        declare_tasks(&mut graph, &config, &toolchain);

        Self { config, graph }
    }

    /// Configuration the rules were declared for
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Underlying rule graph
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Bring a named target up to date
    pub fn run(&self, target: Target) -> BuildResult<BuildReport> {
        log::debug!("invoking {}", target);
        self.graph.invoke(target.name())
    }

    /// Bring an arbitrary task or file target up to date
    pub fn invoke(&self, target: &str) -> BuildResult<BuildReport> {
        self.graph.invoke(target)
    }
}

fn declare_objects(
    graph: &mut TaskGraph,
    config: &Rc<BuildConfig>,
    resolver: &Rc<PathResolver>,
    toolchain: &Rc<dyn Toolchain>,
) {
    let mut object_dirs = vec![config.build_dir.clone()];
    object_dirs.extend(config.library_build_dirs());
    for dir in &object_dirs {
        graph.directory(dir);
    }

    let prereq_resolver = Rc::clone(resolver);
    let compile_resolver = Rc::clone(resolver);
    let config = Rc::clone(config);
    let toolchain = Rc::clone(toolchain);

    graph.rule(
        ".o",
        move |object| {
            let mut prerequisites = vec![prereq_resolver.source_for_object(object)];
            prerequisites.extend(object_dirs.iter().cloned());
            prerequisites
        },
        move |object, prerequisites| {
            let source = prerequisites
                .first()
                .ok_or_else(|| BuildError::no_rule(object))?;
            let includes = library_includes(&compile_resolver)?;
            let invocation = Flags::new(&config).compile(&includes, source, object);
            toolchain.run(&invocation)
        },
    );
}

fn declare_archive(
    graph: &mut TaskGraph,
    config: &Rc<BuildConfig>,
    resolver: &Rc<PathResolver>,
    toolchain: &Rc<dyn Toolchain>,
) {
    let resolver = Rc::clone(resolver);
    let action_config = Rc::clone(config);
    let toolchain = Rc::clone(toolchain);

    graph.file(
        &config.archive,
        Prerequisites::deferred(move || resolver.all_library_objects()),
        move |archive, objects| {
            toolchain.run(&Flags::new(&action_config).archive(archive, objects))
        },
    );
}

fn declare_image(
    graph: &mut TaskGraph,
    config: &Rc<BuildConfig>,
    resolver: &Rc<PathResolver>,
    toolchain: &Rc<dyn Toolchain>,
) {
    let elf = config.elf_path();
    let archive = config.archive.clone();
    let link_resolver = Rc::clone(resolver);
    let link_config = Rc::clone(config);
    let link_toolchain = Rc::clone(toolchain);

    graph.file(
        &elf,
        Prerequisites::deferred(move || {
            let mut inputs = link_resolver.project_objects()?;
            inputs.push(archive.clone());
            Ok(inputs)
        }),
        move |elf, inputs| link_toolchain.run(&Flags::new(&link_config).link(inputs, elf)),
    );

    let hex_config = Rc::clone(config);
    let hex_toolchain = Rc::clone(toolchain);
    graph.file(config.hex_path(), vec![elf.clone()], move |hex, _| {
        let flags = Flags::new(&hex_config);
        hex_toolchain.run(&flags.size(&elf))?;
        hex_toolchain.run(&flags.objcopy(&elf, hex))
    });
}

fn declare_tasks(graph: &mut TaskGraph, config: &Rc<BuildConfig>, toolchain: &Rc<dyn Toolchain>) {
    graph.task(
        Target::Hex.name(),
        Some(Target::Hex.description()),
        vec![Dependency::File(config.hex_path())],
        None,
    );

    let upload_config = Rc::clone(config);
    let upload_toolchain = Rc::clone(toolchain);
    let install: Action = Box::new(move |_: &Path, _: &[PathBuf]| {
        let hex = upload_config.hex_path();
        upload_toolchain.run(&Flags::new(&upload_config).upload(&hex))
    });
    graph.task(
        Target::Install.name(),
        Some(Target::Install.description()),
        vec![Dependency::Task(Target::Hex.name().to_string())],
        Some(install),
    );

    let build_dir = config.build_dir.clone();
    let clean: Action = Box::new(move |_: &Path, _: &[PathBuf]| remove_build_dir(&build_dir));
    graph.task(
        Target::Clean.name(),
        Some(Target::Clean.description()),
        Vec::new(),
        Some(clean),
    );
}

/// Resolved include directory of every configured library
fn library_includes(resolver: &PathResolver) -> BuildResult<Vec<(String, PathBuf)>> {
    resolver
        .libraries()
        .iter()
        .map(|lib| -> BuildResult<(String, PathBuf)> {
            Ok((lib.clone(), resolver.library_include_dir(lib)?))
        })
        .collect()
}

fn remove_build_dir(build_dir: &Path) -> BuildResult<()> {
    if !build_dir.exists() {
        log::debug!("{} already absent", build_dir.display());
        return Ok(());
    }
    log::info!("rm -rf {}", build_dir.display());
    fs::remove_dir_all(build_dir).map_err(|e| BuildError::io(build_dir, e))
}
