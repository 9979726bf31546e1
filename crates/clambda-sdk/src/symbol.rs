//! Operation names published by the host
//!
//! These strings are the wire format between host and module: the module asks
//! the host's lookup function for each of them by exact name.

macro_rules! symbols {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal, )+) => {
        /// A native operation the host publishes by name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Symbol {
            $( $(#[$doc])* $variant, )+
        }

        impl Symbol {
            /// Every operation, in table order
            pub const ALL: &'static [Symbol] = &[ $( Symbol::$variant, )+ ];

            /// The exact lookup name
            pub const fn name(self) -> &'static str {
                match self {
                    $( Symbol::$variant => $name, )+
                }
            }

            /// The lookup name as NUL-terminated bytes, ready for the C lookup call
            pub const fn name_with_nul(self) -> &'static [u8] {
                match self {
                    $( Symbol::$variant => concat!($name, "\0").as_bytes(), )+
                }
            }
        }
    };
}

symbols! {
    /// Allocate an integer
    NewInt64 => "new_vm_int64",
    /// Allocate a float
    NewFloat64 => "new_vm_float64",
    /// Allocate a string (copied from a C string)
    NewString => "new_vm_string",
    /// Allocate a boolean
    NewBoolean => "new_vm_boolean",
    /// Allocate the null value
    NewNull => "new_vm_null",
    /// Allocate a byte sequence (copied)
    NewBytes => "new_vm_bytes",
    /// Allocate an empty tuple
    NewTuple => "new_vm_tuple",
    /// Allocate a key-value pair
    NewKeyVal => "new_vm_keyval",
    /// Allocate a named value
    NewNamed => "new_vm_named",
    /// Allocate a wrapper
    NewWrapper => "new_vm_wrapper",
    /// Kind predicate
    IsInt => "is_vm_int",
    /// Kind predicate
    IsFloat => "is_vm_float",
    /// Kind predicate
    IsString => "is_vm_string",
    /// Kind predicate
    IsBoolean => "is_vm_boolean",
    /// Kind predicate
    IsNull => "is_vm_null",
    /// Kind predicate
    IsBytes => "is_vm_bytes",
    /// Kind predicate
    IsTuple => "is_vm_tuple",
    /// Kind predicate
    IsKeyVal => "is_vm_keyval",
    /// Kind predicate
    IsNamed => "is_vm_named",
    /// Kind predicate
    IsWrapper => "is_vm_wrapper",
    /// Read an integer payload
    IntValue => "get_vm_int_value",
    /// Read a float payload
    FloatValue => "get_vm_float_value",
    /// Copy a string payload into a host-allocated C string
    StringValue => "get_vm_string_value",
    /// Read a boolean payload
    BooleanValue => "get_vm_boolean_value",
    /// Free a C string returned by `get_vm_string_value`
    FreeString => "free_vm_string",
    /// Append to a tuple in place
    TupleAppend => "vm_tuple_append",
    /// Read a tuple element
    TupleGet => "vm_tuple_get",
    /// Read the value slot of a key-value, named or wrapper node
    GetValue => "get_vm_value",
    /// Read the key slot of a key-value or named node
    GetKey => "get_vm_key",
    /// Replace the value slot of a key-value, named or wrapper node
    SetValue => "set_vm_value",
    /// Element count of a sized value
    GetLen => "get_len",
    /// Increment the reference count
    CloneRef => "clone_ref",
    /// Decrement the reference count
    DropRef => "drop_ref",
}

impl Symbol {
    /// Number of operations
    pub const COUNT: usize = Self::ALL.len();

    /// Position in [`Symbol::ALL`]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Find an operation by its lookup name
    pub fn from_name(name: &str) -> Option<Symbol> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<&str> = Symbol::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), Symbol::COUNT);
    }

    #[test]
    fn test_index_matches_table_order() {
        for (i, symbol) in Symbol::ALL.iter().enumerate() {
            assert_eq!(symbol.index(), i);
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(Symbol::NewFloat64.name(), "new_vm_float64");
        assert_eq!(Symbol::IsTuple.name(), "is_vm_tuple");
        assert_eq!(Symbol::TupleGet.name(), "vm_tuple_get");
        assert_eq!(Symbol::CloneRef.name(), "clone_ref");
        assert_eq!(Symbol::DropRef.name(), "drop_ref");
    }

    #[test]
    fn test_name_with_nul() {
        for symbol in Symbol::ALL {
            let bytes = symbol.name_with_nul();
            assert_eq!(bytes.last(), Some(&0));
            assert_eq!(&bytes[..bytes.len() - 1], symbol.name().as_bytes());
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Symbol::from_name("get_len"), Some(Symbol::GetLen));
        assert_eq!(Symbol::from_name("no_such_op"), None);
    }
}
