//! Macros for ergonomic state declarations.

/// Generate a `State` implementation and a `variants()` list for a
/// fieldless enum.
///
/// # Example
///
/// ```
/// use rewind::state_enum;
/// use rewind::core::State;
///
/// state_enum! {
///     pub enum Phase {
///         Draft,
///         Review,
///         Published,
///     }
/// }
///
/// assert_eq!(Phase::Review.name(), "Review");
/// assert_eq!(Phase::variants().len(), 3);
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            #[allow(dead_code)]
            pub fn variants() -> Vec<Self> {
                vec![$(Self::$variant),*]
            }
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
