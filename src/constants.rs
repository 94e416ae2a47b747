pub const AGENTIC_DETECTION_ENDPOINT: &str =
    "https://api.va.landing.ai/v1/tools/agentic-object-detection";
pub const DEFAULT_MODEL: &str = "agentic";
pub const DEFAULT_PROMPT: &str = "flowers";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("agvision/", env!("CARGO_PKG_VERSION"));

pub const API_KEY_ENV: &str = "LANDINGAI_API_KEY";
pub const CONFIG_PATH_ENV: &str = "AGVISION_CONFIG";

pub const DEFAULT_INPUT_IMAGE: &str = "flower_test.jpeg";
pub const RESULTS_FILE_NAME: &str = "flower_results.json";
pub const REPORT_FILE_NAME: &str = "flower_analysis.json";

pub const DEFAULT_DASHBOARD_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;
