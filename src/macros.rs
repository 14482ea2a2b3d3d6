// ABOUTME: Declarative macros shared across the crate
// ABOUTME: Fluent builder setters for configuration and message types

/// Macro for generating builder setter methods
///
/// Each method takes a value, sets the corresponding field,
/// and returns self for method chaining.
///
/// # Arguments
/// * `$($field:ident: $type:ty),*` - Field name and type pairs
///
/// # Generated code
/// For each field, generates:
/// ```text
/// pub fn $field(mut self, $field: $type) -> Self {
///     self.$field = $field;
///     self
/// }
/// ```
macro_rules! builder_setters {
    ($($field:ident: $type:ty),* $(,)?) => {
        $(
            pub fn $field(mut self, $field: $type) -> Self {
                self.$field = $field;
                self
            }
        )*
    };
}

pub(crate) use builder_setters;
