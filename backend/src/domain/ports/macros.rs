//! `define_port_error!`: port error enums with snake_case constructors.
//!
//! Every variant carries named fields. The macro derives `thiserror::Error`
//! and adds one constructor per variant taking `impl Into<T>` for each field,
//! so adapters can write `StudentRepositoryError::query(err.to_string())`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),+ $(,)? } => $message:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field: $ty),+ },
            )+
        }

        ::paste::paste! {
            impl $name {
                $(
                    #[doc = concat!("Build a [`", stringify!($name), "::", stringify!($variant), "`].")]
                    pub fn [<$variant:snake>]($($field: impl Into<$ty>),+) -> Self {
                        Self::$variant { $($field: $field.into()),+ }
                    }
                )+
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        /// Failures of a pretend document store.
        pub enum ProbeError {
            Unreachable { host: String } => "store at {host} is unreachable",
            Rejected { collection: String, code: i32 } => "{collection} rejected the write ({code})",
        }
    }

    #[rstest]
    fn string_fields_accept_borrowed_input() {
        let err = ProbeError::unreachable("db:27017");
        assert_eq!(
            err,
            ProbeError::Unreachable {
                host: "db:27017".to_owned()
            }
        );
        assert_eq!(err.to_string(), "store at db:27017 is unreachable");
    }

    #[rstest]
    fn constructors_take_every_field_in_order() {
        let err = ProbeError::rejected("students", 11000);
        assert_eq!(err.to_string(), "students rejected the write (11000)");
    }
}
