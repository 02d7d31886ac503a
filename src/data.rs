use itertools::iproduct;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// Type aliases for clarity
pub type CourseId = u64;
pub type TeacherId = u64;
pub type RoomId = u64;

/// Weekly hours assumed for a course whose requirement is missing or unusable.
pub const DEFAULT_WEEKLY_HOURS: u32 = 3;

/// One academic subject offering.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    /// `None` when the declared value was absent or not a non-negative integer.
    #[serde(default, deserialize_with = "lenient_hours")]
    pub weekly_hours: Option<u32>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
}

impl Course {
    /// Lecture hours this course asks for in a week.
    pub fn required_hours(&self) -> u32 {
        self.weekly_hours.unwrap_or(DEFAULT_WEEKLY_HOURS)
    }

    /// Text shown for the subject inside a grid cell: name, then code, then "Subject".
    pub fn subject_label(&self) -> &str {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.code))
            .unwrap_or("Subject")
    }

    /// Short label for log lines and shortfall reports: code first, then name.
    pub fn report_label(&self) -> String {
        non_empty(&self.code)
            .or_else(|| non_empty(&self.name))
            .map(str::to_string)
            .unwrap_or_else(|| format!("course #{}", self.id))
    }

    /// Teacher id to resolve, if any. Id 0 counts as unassigned.
    pub fn assigned_teacher(&self) -> Option<TeacherId> {
        self.teacher_id.filter(|&id| id != 0)
    }

    /// `department_lower` must already be lowercased.
    pub fn in_department(&self, department_lower: &str) -> bool {
        self.department.as_deref().unwrap_or("").to_lowercase() == department_lower
    }
}

/// A faculty member.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
}

/// Represents a physical room. Capacity is carried but not used for placement.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl Room {
    /// Stand-in used when no rooms have been registered.
    pub fn placeholder() -> Self {
        Room {
            id: 0,
            name: "Room-1".to_string(),
            capacity: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// Accepts non-negative integral numbers (2 or 2.0) and numeric strings;
// everything else decodes as absent.
fn lenient_hours<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let hours = value.and_then(|value| match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|h| h.is_finite() && *h >= 0.0 && h.fract() == 0.0)
                .map(|h| h as u64)
        }),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    });
    Ok(hours.and_then(|h| u32::try_from(h).ok()))
}

/// Teaching days, in week order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; 6] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The slots of a day that may hold a lecture, in day order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum LectureSlot {
    #[serde(rename = "9-10")]
    NineToTen,
    #[serde(rename = "10-11")]
    TenToEleven,
    #[serde(rename = "11-12")]
    ElevenToTwelve,
    #[serde(rename = "1-2")]
    OneToTwo,
    #[serde(rename = "2-3")]
    TwoToThree,
    #[serde(rename = "3-4")]
    ThreeToFour,
}

impl LectureSlot {
    pub const ALL: [LectureSlot; 6] = [
        LectureSlot::NineToTen,
        LectureSlot::TenToEleven,
        LectureSlot::ElevenToTwelve,
        LectureSlot::OneToTwo,
        LectureSlot::TwoToThree,
        LectureSlot::ThreeToFour,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            LectureSlot::NineToTen => "9-10",
            LectureSlot::TenToEleven => "10-11",
            LectureSlot::ElevenToTwelve => "11-12",
            LectureSlot::OneToTwo => "1-2",
            LectureSlot::TwoToThree => "2-3",
            LectureSlot::ThreeToFour => "3-4",
        }
    }
}

impl fmt::Display for LectureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Lecture,
    Break,
}

/// One row of the displayed day: a lecture slot or a fixed break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRow {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: RowKind,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_label: Option<&'static str>,
    #[serde(skip)]
    pub slot: Option<LectureSlot>,
}

impl TimeRow {
    const fn lecture(slot: LectureSlot, label: &'static str) -> Self {
        TimeRow {
            id: slot.id(),
            kind: RowKind::Lecture,
            label,
            break_label: None,
            slot: Some(slot),
        }
    }

    const fn pause(id: &'static str, label: &'static str, break_label: &'static str) -> Self {
        TimeRow {
            id,
            kind: RowKind::Break,
            label,
            break_label: Some(break_label),
            slot: None,
        }
    }
}

/// Every row of the displayed day, breaks included. Breaks are never scheduled.
pub const TIME_ROWS: [TimeRow; 8] = [
    TimeRow::lecture(LectureSlot::NineToTen, "09:00 – 10:00"),
    TimeRow::lecture(LectureSlot::TenToEleven, "10:00 – 11:00"),
    TimeRow::pause("tea-break", "11:00 – 11:20", "Tea Break"),
    TimeRow::lecture(LectureSlot::ElevenToTwelve, "11:20 – 12:20"),
    TimeRow::pause("lunch-break", "12:20 – 13:20", "Lunch Break"),
    TimeRow::lecture(LectureSlot::OneToTwo, "13:20 – 14:20"),
    TimeRow::lecture(LectureSlot::TwoToThree, "14:20 – 15:20"),
    TimeRow::lecture(LectureSlot::ThreeToFour, "15:20 – 16:20"),
];

/// Day -> lecture slot -> cell text. An empty string means nothing is placed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct WeeklyGrid(BTreeMap<Day, BTreeMap<LectureSlot, String>>);

impl WeeklyGrid {
    /// A grid with every day and lecture slot present and empty.
    pub fn empty() -> Self {
        let mut cells: BTreeMap<Day, BTreeMap<LectureSlot, String>> = BTreeMap::new();
        for (day, slot) in iproduct!(Day::ALL, LectureSlot::ALL) {
            cells.entry(day).or_default().insert(slot, String::new());
        }
        WeeklyGrid(cells)
    }

    pub fn cell(&self, day: Day, slot: LectureSlot) -> &str {
        self.0
            .get(&day)
            .and_then(|row| row.get(&slot))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_free(&self, day: Day, slot: LectureSlot) -> bool {
        self.cell(day, slot).is_empty()
    }

    pub(crate) fn place(&mut self, day: Day, slot: LectureSlot, text: String) {
        self.0.entry(day).or_default().insert(slot, text);
    }

    /// Non-empty cells in day order, then slot order.
    pub fn placements(&self) -> impl Iterator<Item = (Day, LectureSlot, &str)> + '_ {
        iproduct!(Day::ALL, LectureSlot::ALL)
            .map(move |(day, slot)| (day, slot, self.cell(day, slot)))
            .filter(|(_, _, text)| !text.is_empty())
    }

    /// Rows for tabular consumers: a header, then one row per time row with
    /// break rows filled with their break label.
    pub fn table(&self) -> Vec<Vec<String>> {
        let mut header = vec!["Time".to_string()];
        header.extend(Day::ALL.iter().map(|day| day.name().to_string()));

        let mut rows = vec![header];
        for row in &TIME_ROWS {
            let mut line = vec![row.label.to_string()];
            match (row.slot, row.break_label) {
                (Some(slot), _) => {
                    line.extend(Day::ALL.iter().map(|&day| self.cell(day, slot).to_string()))
                }
                (None, label) => {
                    let label = label.unwrap_or_default();
                    line.extend(Day::ALL.iter().map(|_| label.to_string()))
                }
            }
            rows.push(line);
        }
        rows
    }
}

impl Default for WeeklyGrid {
    fn default() -> Self {
        WeeklyGrid::empty()
    }
}

/// Input for one generation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub courses: Vec<Course>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShortfallReason {
    /// Hours withheld because the teacher reached the weekly cap.
    TeacherCapReached,
    /// A full pass over the week found no eligible cell.
    NoFreeSlot,
}

/// A course that ended the run with fewer hours than it declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub course_id: CourseId,
    pub course: String,
    pub declared: u32,
    /// Hours the run tried to place after applying the teacher cap.
    pub target: u32,
    pub placed: u32,
    pub reason: ShortfallReason,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.reason {
            ShortfallReason::TeacherCapReached => "teacher weekly cap reached",
            ShortfallReason::NoFreeSlot => "no free slot",
        };
        write!(
            f,
            "[{}] placed {}/{} (declared {}): {}",
            self.course, self.placed, self.target, self.declared, reason
        )
    }
}

/// The result of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub grid: WeeklyGrid,
    /// The department filter matched nothing and every course was scheduled.
    pub department_fallback: bool,
    pub shortfalls: Vec<Shortfall>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn weekly_hours_decode_leniently() {
        let hours = |value: serde_json::Value| {
            let course: Course =
                serde_json::from_value(json!({ "id": 1, "weeklyHours": value })).unwrap();
            course.required_hours()
        };

        assert_eq!(hours(json!(2)), 2);
        assert_eq!(hours(json!(2.0)), 2);
        assert_eq!(hours(json!("4")), 4);
        assert_eq!(hours(json!(0)), 0);
        assert_eq!(hours(json!(-1)), DEFAULT_WEEKLY_HOURS);
        assert_eq!(hours(json!(2.5)), DEFAULT_WEEKLY_HOURS);
        assert_eq!(hours(json!("two")), DEFAULT_WEEKLY_HOURS);
        assert_eq!(hours(json!(null)), DEFAULT_WEEKLY_HOURS);

        let missing: Course = serde_json::from_value(json!({ "id": 2 })).unwrap();
        assert_eq!(missing.required_hours(), DEFAULT_WEEKLY_HOURS);
        assert_eq!(missing.teacher_id, None);
    }

    #[test]
    fn subject_label_falls_back_to_code_then_placeholder() {
        let mut course: Course =
            serde_json::from_value(json!({ "id": 1, "code": "CS101", "name": "" })).unwrap();
        assert_eq!(course.subject_label(), "CS101");
        course.name = Some("Intro to Programming".into());
        assert_eq!(course.subject_label(), "Intro to Programming");
        course.name = None;
        course.code = None;
        assert_eq!(course.subject_label(), "Subject");
        assert_eq!(course.report_label(), "course #1");
    }

    #[test]
    fn time_rows_match_lecture_slots() {
        let lecture_ids: Vec<&str> = TIME_ROWS
            .iter()
            .filter(|row| row.kind == RowKind::Lecture)
            .map(|row| row.id)
            .collect();
        let slot_ids: Vec<&str> = LectureSlot::ALL.iter().map(|slot| slot.id()).collect();
        assert_eq!(lecture_ids, slot_ids);

        let breaks: Vec<(&str, Option<&str>)> = TIME_ROWS
            .iter()
            .filter(|row| row.kind == RowKind::Break)
            .map(|row| (row.id, row.break_label))
            .collect();
        assert_eq!(
            breaks,
            vec![
                ("tea-break", Some("Tea Break")),
                ("lunch-break", Some("Lunch Break"))
            ]
        );
    }

    #[test]
    fn empty_grid_serializes_every_day_and_slot() {
        let value = serde_json::to_value(WeeklyGrid::empty()).unwrap();
        let days = value.as_object().unwrap();
        assert_eq!(days.len(), 6);
        for day in Day::ALL {
            let slots = days[day.name()].as_object().unwrap();
            assert_eq!(slots.len(), 6);
            assert_eq!(slots["1-2"], json!(""));
            assert!(!slots.contains_key("tea-break"));
        }
    }

    #[test]
    fn grid_round_trips_through_json() {
        let mut grid = WeeklyGrid::empty();
        grid.place(Day::Friday, LectureSlot::TwoToThree, "Physics – TBD (Room-1)".into());
        let text = serde_json::to_string(&grid).unwrap();
        let back: WeeklyGrid = serde_json::from_str(&text).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn table_synthesizes_break_rows() {
        let mut grid = WeeklyGrid::empty();
        grid.place(Day::Tuesday, LectureSlot::ElevenToTwelve, "Maths – TBD (LH-1)".into());
        let table = grid.table();

        assert_eq!(table.len(), 1 + TIME_ROWS.len());
        assert_eq!(table[0][0], "Time");
        assert_eq!(table[0][6], "Saturday");
        assert_eq!(table[3][0], "11:00 – 11:20");
        assert!(table[3][1..].iter().all(|cell| cell == "Tea Break"));
        assert_eq!(table[4][0], "11:20 – 12:20");
        assert_eq!(table[4][2], "Maths – TBD (LH-1)");
        assert_eq!(table[4][1], "");
        assert_eq!(table[5][1], "Lunch Break");
    }

    #[test]
    fn placements_skip_empty_cells() {
        let mut grid = WeeklyGrid::empty();
        grid.place(Day::Saturday, LectureSlot::NineToTen, "B".into());
        grid.place(Day::Monday, LectureSlot::ThreeToFour, "A".into());
        let placed: Vec<_> = grid.placements().collect();
        assert_eq!(
            placed,
            vec![
                (Day::Monday, LectureSlot::ThreeToFour, "A"),
                (Day::Saturday, LectureSlot::NineToTen, "B")
            ]
        );
    }
}
