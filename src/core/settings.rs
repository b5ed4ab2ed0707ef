//! Core settings and constants for heuristic SQL injection detection

/// Pages below this ratio against their own refetch are treated as dynamic
pub const SIMILARITY_RATIO: f64 = 0.9;

/// Lower and upper values for match ratio
pub const LOWER_RATIO_BOUND: f64 = 0.02;
pub const UPPER_RATIO_BOUND: f64 = 0.98;

/// Minimum distance between TRUE and FALSE ratios to count as a swing
pub const DIFF_TOLERANCE: f64 = 0.05;

/// Bodies longer than this (in bytes) are never diffed
pub const MAX_DIFFLIB_SEQUENCE_LENGTH: usize = 10 * 1024 * 1024;

/// Characters kept on each side of a dynamic zone as its boundary marker
pub const DYNAMICITY_BOUNDARY_LENGTH: usize = 20;

/// Delay between consecutive probe requests
pub const DEFAULT_DELAY_MS: u64 = 500;

/// Upper bound (exclusive) for random parameter probe values
pub const RANDOM_PROBE_MAX: u32 = 10_000;

/// Length of the random tail appended to boundary payloads
pub const RANDOM_TAIL_LENGTH: usize = 4;

/// Literal-context closers, tried in this order
pub const CLOSE_TYPES: &[&str] = &["'", "\"", "", "')", "\")"];

/// Phrases emitted by runtimes when user input fails type/format conversion
pub const FORMAT_EXCEPTION_STRINGS: &[&str] = &[
    "Type mismatch",
    "Error converting",
    "Please enter a",
    "Conversion failed",
    "String or binary data would be truncated",
    "Failed to convert",
    "unable to interpret text value",
    "Input string was not in a correct format",
    "System.FormatException",
    "java.lang.NumberFormatException",
    "ValueError: invalid literal",
    "TypeMismatchException",
    "CF_SQL_INTEGER",
    "CF_SQL_NUMERIC",
    "for CFSQLTYPE ",
    "cfqueryparam cfsqltype",
    "InvalidParamTypeException",
    "Invalid parameter type",
    "Attribute validation error for tag",
    "is not of type numeric",
    "<cfif Not IsNumeric(",
    "invalid input syntax for integer",
    "invalid input syntax for type",
    "invalid number",
    "character to number conversion error",
    "String was not recognized as a valid",
    "Convert.ToInt",
    "cannot be converted to a ",
    "InvalidDataException",
    "Arguments are of the wrong type",
];

/// Appendix used for the non-SQLi (markup reflection) hint probe
pub const DUMMY_NON_SQLI_CHECK_APPENDIX: &str = "<'\">";

/// File inclusion error pattern
pub const FI_ERROR_REGEX: &str = r"(?i)[^\n]{0,100}(no such file|failed (to )?open)[^\n]{0,100}";

/// Status code that makes a target untestable
pub const NOT_FOUND_STATUS: u16 = 404;
