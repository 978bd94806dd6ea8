//! Names defined with `#define` during a compilation session.

use fxhash::FxHashMap;

use crate::reporting::Error;
use crate::source::FileRange;

#[derive(Default)]
pub struct Macros {
    defined: FxHashMap<String, FileRange>,
}

impl Macros {
    pub fn new() -> Macros {
        Macros::default()
    }

    /// Define `name`, failing if it was already defined anywhere in the
    /// session. There is no way to undefine a name.
    pub fn define(&mut self, name: &str, range: FileRange) -> Result<(), Error> {
        if let Some(previous) = self.defined.get(name) {
            return Err(Error::DuplicateDefine {
                name: name.to_owned(),
                range,
                previous: *previous,
            });
        }
        self.defined.insert(name.to_owned(), range);
        Ok(())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::Files;
    use crate::source::ByteRange;

    #[test]
    fn define_twice() {
        let mut files = Files::new();
        let file_id = files.add("a.idl", "#define A\n#define A\n");
        let first = FileRange::new(file_id, ByteRange::new(8, 9));
        let second = FileRange::new(file_id, ByteRange::new(18, 19));

        let mut macros = Macros::new();
        assert!(!macros.is_defined("A"));
        macros.define("A", first).unwrap();
        assert!(macros.is_defined("A"));

        match macros.define("A", second) {
            Err(Error::DuplicateDefine { name, previous, .. }) => {
                assert_eq!(name, "A");
                assert_eq!(previous, first);
            }
            result => panic!("unexpected result: {result:?}"),
        }
    }
}
