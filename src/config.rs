use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use crate::date::{default_window_end, parse_datetime, TimeWindow, DEFAULT_WINDOW_BEGIN};
use crate::events::{default_events, default_notes, Event, Note};

/// Accounts allowed to open live threads (the subreddit's moderators).
pub const DEFAULT_ACCOUNTS: &[&str] = &[
    "qgyh2", "maxwellhill", "BritishEnglishPolice", "anutensil", "bennjammin",
    "DoremusJessup", "emmster", "green_flash", "PraiseBeToScience", "WorldNewsMods",
    "DonTago", "istara", "Fluttershy_qtest", "Surf_Science", "imdpathway",
    "Isentrope", "PlanetGuy", "alexander1701", "wrc-wolf", "10ebbor10",
    "seewolfmdk", "mutatron", "alfix8", "dieyoufool3", "MushroomMountain123",
    "TheEarthquakeGuy", "GrumpyFinn", "BestFriendWatermelon", "NYLaw", "hasharin",
    "tinkthank", "DaisyKitty", "kwwxis", "BlatantConservative", "vikinick",
    "pussgurka", "progress18", "Morning-Chub", "hankhillforprez", "Core_Four",
    "nt337", "sunbolts", "photonmarchrhopi", "PoppinKREAM", "Last_Jedi",
    "ssnistfajen", "FreedomsPower", "Handicapreader", "maybesaydie", "_BindersFullOfWomen_",
    "doc_two_thirty", "moombai", "abrownn", "That_Cupcake", "Llim",
    "slakmehl", "MarktpLatz", "Mazon_Del", "Leerzeichen14", "MisterMysterios",
    "SirT6", "Ferelar", "Captcha_Imagination", "ThaneKyrell", "thatnameagain",
    "loljetfuel", "Tidorith", "Gunboat_DiplomaC", "Petrichordates", "Hard_on_Collider",
    "RedSquirrelFtw", "jfoobar", "ZippyDan", "Yglorba", "AftyOfTheUK",
    "Trips-Over-Tail", "Wonckay", "Turicus", "isnotmad", "Iustis",
    "IsNotACleverMan", "Randvek", "terminal_mole", "grmmrnz", "mvea",
    "Iphotoshopincats", "UGMadness", "ToadProphet", "PapaKnowsDominoes", "L_Cranston_Shadow",
    "allessandro", "MSchmahl", "indi_n0rd", "The_Majestic_", "Benocrates",
    "ThucydidesOfAthens", "Emmx2039", "valuingvulturefix", "Cicero912", "whistleridge",
    "Tetizeraz", "Duglitt", "ontrack", "SecureThruObscure", "AdClemson",
    "jman005", "muffpatty", "FLAlex111", "UrynSM", "-doughboy",
    "AutoModerator", "AkaashMaharaj",
];

/// Accepted (lowercase) title prefixes of a live thread.
pub const DEFAULT_TITLE_PREFIXES: &[&str] = &[
    "/r/worldnews live thread",
    "r/worldnews live thread",
    "worldnews live thread",
];

/// Posts read per account, newest first.
pub const DEFAULT_LOOKBACK: usize = 200;

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct EtlOptions {
    pub data_dir: PathBuf,
    pub accounts: Vec<String>,
    pub title_prefixes: Vec<String>, // normalized lowercase
    pub window: TimeWindow,          // [begin, end)
    pub lookback: usize,
    pub fail_fast: bool,             // abort the fetch run on the first thread error
    pub parallelism: Option<usize>,  // rayon threads for loading comment files
    pub progress: bool,
}

impl Default for EtlOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            accounts: DEFAULT_ACCOUNTS.iter().map(|s| s.to_string()).collect(),
            title_prefixes: DEFAULT_TITLE_PREFIXES.iter().map(|s| s.to_string()).collect(),
            window: TimeWindow::default_as_of(OffsetDateTime::now_utc()),
            lookback: DEFAULT_LOOKBACK,
            fail_fast: false,
            parallelism: None,
            progress: true,
        }
    }
}

impl EtlOptions {
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_accounts<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accounts = accounts.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_title_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.title_prefixes = prefixes.into_iter().map(|p| p.as_ref().trim().to_lowercase()).collect();
        self
    }
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }
    pub fn with_lookback(mut self, n: usize) -> Self {
        self.lookback = n.max(1);
        self
    }
    pub fn with_fail_fast(mut self, yes: bool) -> Self {
        self.fail_fast = yes;
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
}

/// Chart text, colours and the fixed annotation lists.
#[derive(Clone, Debug)]
pub struct ChartConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub tag: String,
    pub size: (u32, u32),
    pub line_color: (u8, u8, u8),
    pub face_color: (u8, u8, u8),
    pub grid_color: (u8, u8, u8),
    /// Horizontal distance between an annotation's label and its arrow tip.
    pub label_offset_secs: i64,
    pub events: Vec<Event>,
    pub notes: Vec<Note>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "r/WorldNews interest over the Russian Invasion of Ukraine".into(),
            x_label: "Day".into(),
            y_label: "Hourly comments".into(),
            tag: "u/fferegrino - comments from r/worldnews live threads".into(),
            size: (3000, 840),
            line_color: (0x00, 0x5B, 0xBB),
            face_color: (0xFF, 0xF7, 0xCC),
            grid_color: (0xFF, 0xEE, 0x99),
            label_offset_secs: 60_480, // 0.7 day
            events: default_events(),
            notes: default_notes(),
        }
    }
}

/// Optional JSON config file; present keys override the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub accounts: Option<Vec<String>>,
    pub title_prefixes: Option<Vec<String>>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub lookback: Option<usize>,
    pub events: Option<Vec<Event>>,
    pub notes: Option<Vec<Note>>,
    pub title: Option<String>,
    pub tag: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn apply(&self, mut opts: EtlOptions, chart: &mut ChartConfig) -> Result<EtlOptions> {
        if let Some(a) = &self.accounts {
            opts = opts.with_accounts(a.iter().cloned());
        }
        if let Some(p) = &self.title_prefixes {
            opts = opts.with_title_prefixes(p);
        }
        if self.begin.is_some() || self.end.is_some() {
            let begin = self.begin.as_deref().map(parse_datetime).transpose()?.unwrap_or(DEFAULT_WINDOW_BEGIN);
            let end = match self.end.as_deref() {
                Some(e) => parse_datetime(e)?,
                None => default_window_end(OffsetDateTime::now_utc()),
            };
            opts = opts.with_window(TimeWindow::new(begin, end));
        }
        if let Some(n) = self.lookback {
            opts = opts.with_lookback(n);
        }
        if let Some(ev) = &self.events {
            chart.events = ev.clone();
        }
        if let Some(notes) = &self.notes {
            chart.notes = notes.clone();
        }
        if let Some(t) = &self.title {
            chart.title = t.clone();
        }
        if let Some(t) = &self.tag {
            chart.tag = t.clone();
        }
        Ok(opts)
    }
}

/// Script-app credentials, read from the environment (a `.env` file is honoured by the binary).
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`Credentials::from_env`] over an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |k: &str| get(k).filter(|v| !v.is_empty()).ok_or_else(|| anyhow!("environment variable {k} is not set"));
        Ok(Self {
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            password: required("PASSWORD")?,
            username: get("REDDIT_USERNAME").unwrap_or_else(|| "UkraineNewsBot".to_string()),
            user_agent: get("USER_AGENT").unwrap_or_else(|| "Live Thread Scraper by UkraineNewsBot".to_string()),
        })
    }
}
