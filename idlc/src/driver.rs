use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use std::cell::RefCell;
use std::io::Write;
use std::path::Path;

use crate::emit::Output;
use crate::files::{FileId, Files};
use crate::session::Session;
use crate::storage::{FileSystem, Storage};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

/// Choose colours for a standard stream, disabling them when the stream is
/// not a terminal.
fn color_choice(stream: atty::Stream) -> ColorChoice {
    if atty::is(stream) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

pub struct Driver {
    storage: Box<dyn Storage>,

    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,
    emit_writer: RefCell<Box<dyn WriteColor>>,
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            storage: Box::new(FileSystem),

            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                color_choice(atty::Stream::Stderr),
            ))),
            emit_writer: RefCell::new(Box::new(BufferedStandardStream::stdout(color_choice(
                atty::Stream::Stdout,
            )))),
        }
    }

    /// Setup a global panic hook
    pub fn install_panic_hook(&self) {
        // Use the currently set codespan configuration
        let term_config = self.codespan_config.clone();
        // Fetch the default hook (which prints the panic message and an optional backtrace)
        let default_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            let location = info.location();
            let message = if let Some(message) = info.payload().downcast_ref::<String>() {
                message.as_str()
            } else if let Some(message) = info.payload().downcast_ref::<&str>() {
                message
            } else {
                "unknown panic type"
            };

            let diagnostic = Diagnostic::bug()
                .with_message(format!("compiler panicked at '{message}'"))
                .with_notes(vec![match location {
                    Some(location) => format!("panicked at: {location}"),
                    None => "panicked at: unknown location".to_owned(),
                }]);

            let mut writer = BufferedStandardStream::stderr(color_choice(atty::Stream::Stderr));
            let dummy_files = SimpleFiles::<String, String>::new();

            default_hook(info);
            eprintln!();
            let _ = codespan_reporting::term::emit(
                &mut writer,
                &term_config,
                &dummy_files,
                &diagnostic,
            );
            let _ = writer.flush();
        }));
    }

    /// Set the storage that sources are read from and outputs written to
    pub fn set_storage(&mut self, storage: impl 'static + Storage) {
        self.storage = Box::new(storage);
    }

    /// Override the colour choice of the standard streams
    pub fn set_color_choice(&mut self, color_choice: ColorChoice) {
        self.set_diagnostic_writer(BufferedStandardStream::stderr(color_choice));
        self.set_emit_writer(BufferedStandardStream::stdout(color_choice));
    }

    /// Set the writer to use when rendering diagnostics
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Set the writer to use when reporting the files that were written
    pub fn set_emit_writer(&mut self, stream: impl 'static + WriteColor) {
        self.emit_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Compile the IDL file at `path`, along with everything it includes,
    /// and write the generated TypeScript. Nothing is written unless every
    /// file compiles.
    pub fn compile_and_emit(&mut self, path: &Path) -> Status {
        let mut session = Session::new();
        if let Err(error) = session.compile_file(&*self.storage, path) {
            self.emit_diagnostic(session.files(), error.to_diagnostic());
            return Status::Error;
        }

        let mut status = Status::Ok;
        for output in session.finish() {
            if let Err(error) = self.write_output(&output) {
                let diagnostic = Diagnostic::error().with_message(format!(
                    "couldn't write `{}`: {error}",
                    output.path.display(),
                ));
                self.emit_diagnostic(session.files(), diagnostic);
                status = Status::Error;
            }
        }
        status
    }

    fn write_output(&self, output: &Output) -> std::io::Result<()> {
        match &output.contents {
            Some(contents) => {
                if let Some(parent) = output.path.parent() {
                    self.storage.create_dir_all(parent)?;
                }
                self.storage.write(&output.path, contents)?;
                log::info!("wrote {} bytes to `{}`", contents.len(), output.path.display());
                self.emit_line(&format!("saved to {}", output.path.display()))
            }
            None if self.storage.exists(&output.path) => {
                self.storage.remove(&output.path)?;
                log::info!("removed stale output `{}`", output.path.display());
                self.emit_line(&format!("removed {}", output.path.display()))
            }
            None => Ok(()),
        }
    }

    fn emit_line(&self, line: &str) -> std::io::Result<()> {
        let mut emit_writer = self.emit_writer.borrow_mut();
        writeln!(emit_writer, "{line}")?;
        emit_writer.flush()
    }

    fn emit_diagnostic(&self, files: &Files, diagnostic: Diagnostic<FileId>) {
        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;

        if let Err(error) = codespan_reporting::term::emit(&mut *writer, config, files, &diagnostic)
        {
            log::error!("couldn't render diagnostic: {error}");
        }
        let _ = writer.flush();
    }
}

impl Default for Driver {
    fn default() -> Driver {
        Driver::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use codespan_reporting::term::termcolor::NoColor;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// A writer whose output can be read after it is moved into the driver.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn driver(storage: &MemoryStorage) -> (Driver, SharedBuffer, SharedBuffer) {
        let diagnostics = SharedBuffer::default();
        let emitted = SharedBuffer::default();

        let mut driver = Driver::new();
        driver.set_storage(storage.clone());
        driver.set_diagnostic_writer(NoColor::new(diagnostics.clone()));
        driver.set_emit_writer(NoColor::new(emitted.clone()));
        (driver, diagnostics, emitted)
    }

    #[test]
    fn saves_outputs() {
        let storage = MemoryStorage::new();
        storage.insert("idl/bank.idl", "module Bank { typedef long Id; };\n");

        let (mut driver, diagnostics, emitted) = driver(&storage);
        let status = driver.compile_and_emit(Path::new("idl/bank.idl"));

        assert_eq!(status, Status::Ok);
        assert_eq!(diagnostics.contents(), "");
        assert_eq!(emitted.contents(), "saved to idl/Bank/bank.ts\n");
        assert_eq!(
            storage.get("idl/Bank/bank.ts").as_deref(),
            Some("export type Id = number;\n"),
        );
        assert_eq!(storage.get("idl/bank.ts"), None);
    }

    #[test]
    fn removes_stale_outputs() {
        let storage = MemoryStorage::new();
        storage.insert("m.idl", "module M {\n};\n");
        storage.insert("M/m.ts", "export type Old = number;\n");

        let (mut driver, _, emitted) = driver(&storage);
        assert_eq!(driver.compile_and_emit(Path::new("m.idl")), Status::Ok);
        assert_eq!(emitted.contents(), "removed M/m.ts\n");
        assert_eq!(storage.paths(), vec![PathBuf::from("m.idl")]);
    }

    #[test]
    fn errors_write_nothing() {
        let storage = MemoryStorage::new();
        storage.insert("types.idl", "typedef long Id;\n");
        storage.insert("api.idl", "#include \"types.idl\"\ntypedef frobnicator T;\n");

        let (mut driver, diagnostics, emitted) = driver(&storage);
        let status = driver.compile_and_emit(Path::new("api.idl"));

        assert_eq!(status, Status::Error);
        assert_eq!(status.exit_code(), 1);
        assert_eq!(emitted.contents(), "");
        assert_eq!(storage.get("types.ts"), None);

        let diagnostics = diagnostics.contents();
        assert!(diagnostics.contains("error: unknown type `frobnicator`"));
        assert!(diagnostics.contains("api.idl:2:9"));
    }

    #[test]
    fn reruns_are_byte_identical() {
        let storage = MemoryStorage::new();
        storage.insert(
            "geo.idl",
            "// Shapes\nstruct Point { double x; double y; };\ntypedef sequence<Point> Path;\n",
        );

        let (mut driver, _, _) = driver(&storage);
        assert_eq!(driver.compile_and_emit(Path::new("geo.idl")), Status::Ok);
        let first = storage.get("geo.ts");
        assert_eq!(driver.compile_and_emit(Path::new("geo.idl")), Status::Ok);
        assert_eq!(storage.get("geo.ts"), first);
        assert!(first.is_some());
    }
}
