/// Marker trait for intent objects.
///
/// Intents describe something that happened to a screen: a field was
/// edited, a button was pressed, a background result arrived.
pub trait Intent: Send + 'static {}
