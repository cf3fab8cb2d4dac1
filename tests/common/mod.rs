//! Shared record and enum types for integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeZone, Utc};
use recordio::value::{EnumValue, FromValueError};
use recordio::{
    Bytes, ExtraAttrs, IoAttrs, IoEnum, IoRecord, RecordDescriptor, RecordValue, WireValue,
};

/// Installs a test-writer subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Low,
    Mid,
    High,
}

impl IoEnum for Level {
    const NAME: &'static str = "Level";

    fn members() -> &'static [Self] {
        &[Level::Low, Level::Mid, Level::High]
    }

    fn value(&self) -> EnumValue {
        EnumValue::Int(match self {
            Level::Low => 1,
            Level::Mid => 5,
            Level::High => 10,
        })
    }
}

recordio::impl_io_enum!(Level);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Color {
    Red,
    Green,
}

impl IoEnum for Color {
    const NAME: &'static str = "Color";

    fn members() -> &'static [Self] {
        &[Color::Red, Color::Green]
    }

    fn value(&self) -> EnumValue {
        EnumValue::Str(
            match self {
                Color::Red => "red",
                Color::Green => "green",
            }
            .to_string(),
        )
    }
}

recordio::impl_io_enum!(Color);

/// Members mix int and str values; unsupported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mixed {
    One,
    Two,
}

impl IoEnum for Mixed {
    const NAME: &'static str = "Mixed";

    fn members() -> &'static [Self] {
        &[Mixed::One, Mixed::Two]
    }

    fn value(&self) -> EnumValue {
        match self {
            Mixed::One => EnumValue::Int(1),
            Mixed::Two => EnumValue::Str("two".into()),
        }
    }
}

recordio::impl_io_enum!(Mixed);

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Pos {
    pub x: f64,
    pub y: f64,
}

impl IoRecord for Pos {
    const NAME: &'static str = "Pos";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME).field::<f64>("x").field::<f64>("y")
    }

    fn to_record(&self) -> RecordValue {
        RecordValue::new().with("x", &self.x).with("y", &self.y)
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        Ok(Self {
            x: record.take("x")?,
            y: record.take("y")?,
        })
    }
}

recordio::impl_io_record!(Pos);

/// Singly linked, self-referential.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub value: i64,
    pub next: Option<Box<Node>>,
}

impl Node {
    /// Chain of `len` nodes valued `0..len`.
    pub fn chain(len: usize) -> Node {
        let mut node = Node {
            value: len as i64 - 1,
            next: None,
        };
        for value in (0..len as i64 - 1).rev() {
            node = Node {
                value,
                next: Some(Box::new(node)),
            };
        }
        node
    }
}

impl IoRecord for Node {
    const NAME: &'static str = "Node";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME)
            .field::<i64>("value")
            .field::<Option<Box<Node>>>("next")
    }

    fn to_record(&self) -> RecordValue {
        RecordValue::new().with("value", &self.value).with("next", &self.next)
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        Ok(Self {
            value: record.take("value")?,
            next: record.take("next")?,
        })
    }
}

recordio::impl_io_record!(Node);

/// Mutually referential with [`Child`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parent {
    pub name: String,
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub name: String,
    pub adopted: Option<Box<Parent>>,
}

impl IoRecord for Parent {
    const NAME: &'static str = "Parent";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME)
            .field::<String>("name")
            .field::<Vec<Child>>("children")
    }

    fn to_record(&self) -> RecordValue {
        RecordValue::new().with("name", &self.name).with("children", &self.children)
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        Ok(Self {
            name: record.take("name")?,
            children: record.take("children")?,
        })
    }
}

recordio::impl_io_record!(Parent);

impl IoRecord for Child {
    const NAME: &'static str = "Child";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME)
            .field::<String>("name")
            .field::<Option<Box<Parent>>>("adopted")
    }

    fn to_record(&self) -> RecordValue {
        RecordValue::new().with("name", &self.name).with("adopted", &self.adopted)
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        Ok(Self {
            name: record.take("name")?,
            adopted: record.take("adopted")?,
        })
    }
}

recordio::impl_io_record!(Child);

/// Exercises every field shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub active: bool,
    pub age: i64,
    pub nickname: Option<String>,
    pub tags: BTreeSet<String>,
    pub scores: BTreeMap<String, i64>,
    pub by_id: BTreeMap<i64, String>,
    pub by_level: BTreeMap<Level, bool>,
    pub level: Level,
    pub color: Option<Color>,
    pub coords: (i64, String, f64),
    pub created: DateTime<Utc>,
    pub avatar: Bytes,
    pub meta: WireValue,
    pub home: Pos,
    pub history: Vec<Pos>,
}

impl Profile {
    pub fn sample() -> Profile {
        Profile {
            name: "Alice".into(),
            active: true,
            age: 31,
            nickname: None,
            tags: ["admin", "ops"].iter().map(|t| t.to_string()).collect(),
            scores: [("alice".to_string(), 10), ("bob".to_string(), -2)].into_iter().collect(),
            by_id: [(3, "a".to_string()), (10, "b".to_string())].into_iter().collect(),
            by_level: [(Level::Low, false), (Level::High, true)].into_iter().collect(),
            level: Level::Mid,
            color: Some(Color::Green),
            coords: (7, "north".into(), 1.25),
            created: sample_time(),
            avatar: Bytes(vec![0, 159, 255, 1]),
            meta: WireValue::object([
                ("source", WireValue::from("import")),
                ("ids", WireValue::Array(vec![WireValue::Int(1), WireValue::Null])),
            ]),
            home: Pos { x: 1.5, y: -2.0 },
            history: vec![Pos { x: 0.0, y: 0.0 }, Pos { x: 3.0, y: 4.5 }],
        }
    }
}

impl IoRecord for Profile {
    const NAME: &'static str = "Profile";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME)
            .field::<String>("name")
            .field::<bool>("active")
            .field::<i64>("age")
            .field::<Option<String>>("nickname")
            .field::<BTreeSet<String>>("tags")
            .field::<BTreeMap<String, i64>>("scores")
            .field::<BTreeMap<i64, String>>("by_id")
            .field::<BTreeMap<Level, bool>>("by_level")
            .field::<Level>("level")
            .field::<Option<Color>>("color")
            .field::<(i64, String, f64)>("coords")
            .field::<DateTime<Utc>>("created")
            .field::<Bytes>("avatar")
            .field::<WireValue>("meta")
            .field::<Pos>("home")
            .field::<Vec<Pos>>("history")
    }

    fn to_record(&self) -> RecordValue {
        RecordValue::new()
            .with("name", &self.name)
            .with("active", &self.active)
            .with("age", &self.age)
            .with("nickname", &self.nickname)
            .with("tags", &self.tags)
            .with("scores", &self.scores)
            .with("by_id", &self.by_id)
            .with("by_level", &self.by_level)
            .with("level", &self.level)
            .with("color", &self.color)
            .with("coords", &self.coords)
            .with("created", &self.created)
            .with("avatar", &self.avatar)
            .with("meta", &self.meta)
            .with("home", &self.home)
            .with("history", &self.history)
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        Ok(Self {
            name: record.take("name")?,
            active: record.take("active")?,
            age: record.take("age")?,
            nickname: record.take("nickname")?,
            tags: record.take("tags")?,
            scores: record.take("scores")?,
            by_id: record.take("by_id")?,
            by_level: record.take("by_level")?,
            level: record.take("level")?,
            color: record.take("color")?,
            coords: record.take("coords")?,
            created: record.take("created")?,
            avatar: record.take("avatar")?,
            meta: record.take("meta")?,
            home: record.take("home")?,
            history: record.take("history")?,
        })
    }
}

recordio::impl_io_record!(Profile);

/// Two ints that keep unknown wire keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged {
    pub x: i64,
    pub y: i64,
    pub extra: ExtraAttrs,
}

impl IoRecord for Tagged {
    const NAME: &'static str = "Tagged";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME)
            .field::<i64>("x")
            .field::<i64>("y")
            .keeps_extra_attrs()
    }

    fn to_record(&self) -> RecordValue {
        let mut record = RecordValue::new().with("x", &self.x).with("y", &self.y);
        record.set_extra(self.extra.clone());
        record
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        Ok(Self {
            x: record.take("x")?,
            y: record.take("y")?,
            extra: record.take_extra(),
        })
    }
}

/// Soft defaults, pruning and a storage key alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub display_name: String,
    pub retries: i64,
    pub aliases: Vec<String>,
    pub theme: Color,
}

impl IoRecord for Settings {
    const NAME: &'static str = "Settings";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME)
            .field_with::<String>("display_name", IoAttrs::new().storage_key("dn"))
            .field_with::<i64>("retries", IoAttrs::new().soft_default(3i64).store_default(false))
            .field_with::<Vec<String>>(
                "aliases",
                IoAttrs::new().soft_default_factory(Vec::<String>::new).store_default(false),
            )
            .field_with::<Color>("theme", IoAttrs::new().soft_default(Color::Red))
    }

    fn to_record(&self) -> RecordValue {
        RecordValue::new()
            .with("display_name", &self.display_name)
            .with("retries", &self.retries)
            .with("aliases", &self.aliases)
            .with("theme", &self.theme)
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        Ok(Self {
            display_name: record.take("display_name")?,
            retries: record.take("retries")?,
            aliases: record.take("aliases")?,
            theme: record.take("theme")?,
        })
    }
}

recordio::impl_io_record!(Settings);

impl Settings {
    /// Settings whose defaulted fields all hold their defaults.
    pub fn named(name: &str) -> Self {
        Self {
            display_name: name.into(),
            retries: 3,
            aliases: vec![],
            theme: Color::Red,
        }
    }
}

/// Rejects `lo > hi` at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub lo: i64,
    pub hi: i64,
}

impl IoRecord for Range {
    const NAME: &'static str = "Range";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME).field::<i64>("lo").field::<i64>("hi")
    }

    fn to_record(&self) -> RecordValue {
        RecordValue::new().with("lo", &self.lo).with("hi", &self.hi)
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        let lo: i64 = record.take("lo")?;
        let hi: i64 = record.take("hi")?;
        if lo > hi {
            return Err(FromValueError::new("hi must not be below lo").within_field("hi"));
        }
        Ok(Self { lo, hi })
    }
}

recordio::impl_io_record!(Range);

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub label: String,
    pub range: Range,
}

impl IoRecord for Span {
    const NAME: &'static str = "Span";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME)
            .field::<String>("label")
            .field::<Range>("range")
    }

    fn to_record(&self) -> RecordValue {
        RecordValue::new().with("label", &self.label).with("range", &self.range)
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        Ok(Self {
            label: record.take("label")?,
            range: record.take("range")?,
        })
    }
}

/// A whole-day datetime with an upper bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub day: DateTime<Utc>,
}

fn before_2100(dt: &DateTime<Utc>) -> Result<(), String> {
    if dt.timestamp() >= 4_102_444_800 {
        return Err(format!("{} is after 2100", dt));
    }
    Ok(())
}

impl IoRecord for Booking {
    const NAME: &'static str = "Booking";

    fn describe() -> RecordDescriptor {
        RecordDescriptor::new(Self::NAME).field_with::<DateTime<Utc>>(
            "day",
            IoAttrs::new().whole_days().datetime_validator(before_2100),
        )
    }

    fn to_record(&self) -> RecordValue {
        RecordValue::new().with("day", &self.day)
    }

    fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
        Ok(Self {
            day: record.take("day")?,
        })
    }
}

/// `2024-03-09T14:30:05.123456Z`
pub fn sample_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap() + chrono::Duration::microseconds(123_456)
}
