/// Column names of the employee schema, in output order.
/// The loader requires every one of these to be present in the input header.
pub const EMPLOYEE_ID: &str = "employee_id";
pub const FIRST_NAME: &str = "first_name";
pub const LAST_NAME: &str = "last_name";
pub const EMAIL: &str = "email";
pub const GENDER: &str = "gender";
pub const DEPARTMENT: &str = "department";
pub const JOB_TITLE: &str = "job_title";
pub const HIRE_DATE: &str = "hire_date";
pub const EXIT_DATE: &str = "exit_date";
pub const IS_ACTIVE: &str = "is_active";
pub const SALARY: &str = "salary";
pub const CURRENCY: &str = "currency";
pub const COUNTRY: &str = "country";
pub const STATE: &str = "state";
pub const CITY: &str = "city";
pub const MANAGER_ID: &str = "manager_id";
pub const PERFORMANCE_SCORE: &str = "performance_score";

pub const REQUIRED_COLUMNS: [&str; 17] = [
    EMPLOYEE_ID,
    FIRST_NAME,
    LAST_NAME,
    EMAIL,
    GENDER,
    DEPARTMENT,
    JOB_TITLE,
    HIRE_DATE,
    EXIT_DATE,
    IS_ACTIVE,
    SALARY,
    CURRENCY,
    COUNTRY,
    STATE,
    CITY,
    MANAGER_ID,
    PERFORMANCE_SCORE,
];

// Derived flag columns appended by the writer
pub const INVALID_EMAIL: &str = "invalid_email";
pub const NEGATIVE_SALARY: &str = "negative_salary";
pub const EXIT_BEFORE_HIRE: &str = "exit_before_hire";

pub const FLAG_COLUMNS: [&str; 3] = [INVALID_EMAIL, NEGATIVE_SALARY, EXIT_BEFORE_HIRE];

/// Tokens read as a missing value (compared case-insensitively after trimming)
pub const DEFAULT_MISSING_TOKENS: [&str; 8] = ["", "n/a", "na", "nan", "null", "none", "nat", "-"];

/// Date formats tried in order by the type coercer. Day-first when ambiguous.
pub const DEFAULT_DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

// KPI result file names
pub const HR_KPIS_FILE: &str = "hr_kpis_results.csv";
pub const HIRES_BY_YEAR_FILE: &str = "hires_by_year.csv";
pub const AVG_SALARY_FILE: &str = "avg_salary_by_dept_currency.csv";

pub const DEFAULT_CONFIG_FILE: &str = "hr_cleaner.toml";
pub const REFERENCE_DATE_ENV: &str = "HR_CLEANER_REFERENCE_DATE";
