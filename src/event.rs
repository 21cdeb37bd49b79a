#[derive(Debug, PartialEq)]
pub enum Event {
    Move(f64, f64),
    Capture,
}
