//! Number rendering for explanation text.

/// Render a float for human-readable explanations.
///
/// Integral values keep a single decimal (`3.0`, `100.0`); everything else
/// uses the shortest representation that round-trips (`2.5`, `66.67`).
pub fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
