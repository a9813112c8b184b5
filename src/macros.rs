//! Compile-time typed accessors for declared fields.

/// Generate a reader/writer pair per declared field on a wrapper struct.
///
/// The wrapper must expose its underlying instance in a field named
/// `record`. Each declared field gets a getter named after the field and a
/// writer with the given setter name, both delegating to the generic
/// attribute path — so fields the backend introduces without a local
/// declaration stay reachable through [`Record::get`](crate::Record::get)
/// and [`Record::set`](crate::Record::set) on the same wrapper.
///
/// ```
/// use restmodel::{model_accessors, ModelType, Record};
///
/// static POST: ModelType = ModelType::new("Post");
///
/// struct Post {
///     record: Record,
/// }
///
/// model_accessors!(Post {
///     title => set_title,
///     body => set_body,
/// });
///
/// let mut post = Post { record: Record::new(&POST) };
/// post.set_title("hello");
/// assert_eq!(post.title().and_then(|v| v.as_str()), Some("hello"));
/// ```
#[macro_export]
macro_rules! model_accessors {
    ($wrapper:ident { $($field:ident => $setter:ident),+ $(,)? }) => {
        impl $wrapper {
            $(
                pub fn $field(&self) -> Option<&$crate::Value> {
                    self.record.get(stringify!($field))
                }

                pub fn $setter(&mut self, value: impl Into<$crate::Value>) {
                    self.record.set(stringify!($field), value);
                }
            )+
        }
    };
}
