pub mod differences;
pub mod generator;
pub mod projection;
pub mod table;

pub use differences::{build_differences, DifferenceLine, DifferenceTable, DifferenceTotals};
pub use generator::{generate_table, LineOverride, ScheduleSpec};
pub use projection::build_projection;
pub use table::{AmortizationLine, ScenarioKind, ScenarioTable, ScenarioTotals};
