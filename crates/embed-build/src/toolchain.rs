//! AVR toolchain invocations
//!
//! Argument lists are built by pure functions of the build configuration and
//! the resolved library include directories. Running them is delegated to a
//! [`Toolchain`], so the scheduler can be exercised without `avr-gcc`.

use crate::config::{BuildConfig, CORE_LIBRARY};
use crate::error::{BuildError, BuildResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Flags appended for every non-C compilation unit
const CXX_FLAGS: [&str; 2] = ["-std=c++11", "-fno-exceptions"];

/// External program roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    CCompiler,
    CxxCompiler,
    Archiver,
    Linker,
    Size,
    ObjCopy,
    Uploader,
}

/// One fully constructed external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: Tool,
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    fn new(tool: Tool, program: &str) -> Self {
        Self {
            tool,
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn path(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    fn paths(self, paths: &[PathBuf]) -> Self {
        self.args(paths.iter().map(|p| p.display().to_string()))
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes invocations
pub trait Toolchain {
    /// Run to completion; a nonzero exit is an error
    fn run(&self, invocation: &Invocation) -> BuildResult<()>;
}

/// Spawns the real programs with inherited stdio
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolchain;

impl Toolchain for SystemToolchain {
    fn run(&self, invocation: &Invocation) -> BuildResult<()> {
        log::info!("{}", invocation);

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|e| BuildError::spawn(&invocation.program, e))?;

        if !status.success() {
            return Err(BuildError::exit_status(&invocation.program, status));
        }
        Ok(())
    }
}

/// Whether a compilation unit is plain C
pub fn is_c_source(source: &Path) -> bool {
    source.extension().and_then(|e| e.to_str()) == Some("c")
}

/// Builds argument lists from a configuration
pub struct Flags<'a> {
    config: &'a BuildConfig,
}

impl<'a> Flags<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    /// Code generation flags shared by all compilation units
    pub fn cpp_flags(&self) -> Vec<String> {
        vec![
            "-MMD".to_string(),
            format!("-mmcu={}", self.config.board.mcu),
            "-Wall".to_string(),
            "-ffunction-sections".to_string(),
            "-fdata-sections".to_string(),
            "-Os".to_string(),
        ]
    }

    /// Header search path
    ///
    /// `library_includes` pairs each configured library with its resolved
    /// include directory; the core library is covered by the core dir.
    pub fn includes(&self, library_includes: &[(String, PathBuf)]) -> Vec<String> {
        let mut includes = vec![
            format!("-I{}", self.config.include_dir.display()),
            format!("-I{}", self.config.core_dir().display()),
            format!("-I{}", self.config.variant_dir().display()),
        ];
        includes.extend(
            library_includes
                .iter()
                .filter(|(name, _)| name != CORE_LIBRARY)
                .map(|(_, dir)| format!("-I{}", dir.display())),
        );
        includes
    }

    /// Compile one unit; `.c` goes to the C compiler, anything else to C++
    pub fn compile(
        &self,
        library_includes: &[(String, PathBuf)],
        source: &Path,
        object: &Path,
    ) -> Invocation {
        let programs = &self.config.programs;
        let invocation = if is_c_source(source) {
            Invocation::new(Tool::CCompiler, &programs.cc)
        } else {
            Invocation::new(Tool::CxxCompiler, &programs.cxx)
        };

        let mut invocation = invocation
            .args(self.cpp_flags())
            .args(self.config.board.predefines.iter().cloned())
            .args(self.includes(library_includes));
        if invocation.tool == Tool::CxxCompiler {
            invocation = invocation.args(CXX_FLAGS);
        }
        invocation.path(source).arg("-c").arg("-o").path(object)
    }

    pub fn linker_flags(&self) -> Vec<String> {
        vec![
            format!("-mmcu={}", self.config.board.mcu),
            "-Wl,--gc-sections".to_string(),
            "-Os".to_string(),
        ]
    }

    /// Link objects and archives into the ELF image
    pub fn link(&self, inputs: &[PathBuf], output: &Path) -> Invocation {
        Invocation::new(Tool::Linker, &self.config.programs.cc)
            .args(self.linker_flags())
            .arg("-o")
            .path(output)
            .paths(inputs)
    }

    /// Replace-or-insert objects into a static archive
    pub fn archive(&self, archive: &Path, objects: &[PathBuf]) -> Invocation {
        Invocation::new(Tool::Archiver, &self.config.programs.ar)
            .arg("rcs")
            .path(archive)
            .paths(objects)
    }

    /// Report section sizes of the linked image
    pub fn size(&self, elf: &Path) -> Invocation {
        Invocation::new(Tool::Size, &self.config.programs.size).path(elf)
    }

    /// Convert the linked image to Intel HEX without EEPROM contents
    pub fn objcopy(&self, elf: &Path, hex: &Path) -> Invocation {
        Invocation::new(Tool::ObjCopy, &self.config.programs.objcopy)
            .args(["-O", "ihex", "-R", ".eeprom"])
            .path(elf)
            .path(hex)
    }

    /// Flash the image through the board's bootloader
    pub fn upload(&self, hex: &Path) -> Invocation {
        let board = &self.config.board;
        Invocation::new(Tool::Uploader, &self.config.programs.uploader)
            .arg("-V")
            .arg("-p")
            .arg(board.upload_part.as_str())
            .arg("-D")
            .arg("-c")
            .arg(board.programmer.as_str())
            .arg("-P")
            .arg(self.config.port.as_str())
            .arg("-b")
            .arg(board.upload_baud_rate.to_string())
            .arg("-U")
            .arg(format!("flash:w:{}:i", hex.display()))
    }
}
