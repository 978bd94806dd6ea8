//! The state shared by every file compiled in one run.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use fxhash::FxHashSet;

use crate::ast::Declaration;
use crate::emit::{Emitter, Output};
use crate::files::Files;
use crate::lexer;
use crate::macros::Macros;
use crate::parser::Parser;
use crate::registry::Registry;
use crate::reporting::Error;
use crate::source::FileRange;
use crate::storage::Storage;
use crate::target;

#[derive(Default)]
pub struct Session {
    files: Files,
    macros: Macros,
    registry: Registry,
    emitter: Emitter,
    /// Files whose compilation has started but not finished, innermost last.
    compiling: Vec<PathBuf>,
    compiled: FxHashSet<PathBuf>,
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    pub fn files(&self) -> &Files {
        &self.files
    }

    pub fn macros(&self) -> &Macros {
        &self.macros
    }

    pub fn macros_mut(&mut self) -> &mut Macros {
        &mut self.macros
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Compile the file at `path`, returning its top-level declarations.
    /// Files already compiled in this session are skipped.
    pub fn compile_file(
        &mut self,
        storage: &dyn Storage,
        path: &Path,
    ) -> Result<Vec<Declaration>, Error> {
        if path.extension() != Some(OsStr::new(target::SOURCE_EXTENSION)) {
            log::warn!("`{}` does not have an `.idl` extension", path.display());
        }
        self.compile(storage, path, None)
    }

    /// Compile a file named by an `#include` directive at `range`.
    pub fn include_file(
        &mut self,
        storage: &dyn Storage,
        path: &Path,
        range: FileRange,
    ) -> Result<(), Error> {
        let path = target::normalize(path);
        if self.compiling.contains(&path) {
            return Err(Error::IncludeCycle { path, range });
        }
        self.compile(storage, &path, Some(range))?;
        Ok(())
    }

    pub(crate) fn emit(&mut self, target: &Path, body: &[Declaration]) {
        log::debug!("emitting {} declarations to `{}`", body.len(), target.display());
        self.emitter.emit(target, body);
    }

    /// Take the outputs rendered so far.
    pub fn finish(&mut self) -> Vec<Output> {
        self.emitter.finish()
    }

    fn compile(
        &mut self,
        storage: &dyn Storage,
        path: &Path,
        range: Option<FileRange>,
    ) -> Result<Vec<Declaration>, Error> {
        let path = target::normalize(path);
        if self.compiled.contains(&path) {
            log::debug!("skipping `{}`, compiled already", path.display());
            return Ok(Vec::new());
        }

        let target = target::top_level(&path);
        if target == path {
            return Err(Error::OverwritesSource { path, range });
        }

        let source = storage
            .read_to_string(&path)
            .map_err(|error| Error::ReadFile {
                path: path.clone(),
                range,
                message: error.to_string(),
            })?;
        let file_id = self.files.add(path.display().to_string(), source.clone());
        let tokens = lexer::tokens(file_id, &source)?;
        log::debug!("compiling `{}` ({} tokens)", path.display(), tokens.len());

        self.compiling.push(path.clone());
        let result = Parser::new(self, storage, &path, &source, &tokens, file_id).file(&target);
        self.compiling.pop();
        let body = result?;

        self.compiled.insert(path);
        self.emit(&target, &body);
        Ok(body)
    }
}
