use crate::data::{
    Course, Day, GenerationOutput, GenerationRequest, LectureSlot, Room, RoomId, Shortfall,
    ShortfallReason, Teacher, TeacherId, WeeklyGrid,
};
use itertools::iproduct;
use log::{info, trace, warn};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Lecture hours one teacher may receive in a week, across all of their courses.
pub const MAX_LECTURES_PER_TEACHER: u32 = 3;

/// Teacher label for courses without a resolvable teacher.
pub const UNASSIGNED_TEACHER: &str = "TBD";

type Cell = (Day, LectureSlot);

// Busy-sets and teacher load for a single run. Never shared between runs.
struct Occupancy {
    teachers: HashMap<Cell, HashSet<TeacherId>>,
    rooms: HashMap<Cell, HashSet<RoomId>>,
    load: HashMap<TeacherId, u32>,
}

impl Occupancy {
    fn new(teachers: &[Teacher]) -> Self {
        let cells = || iproduct!(Day::ALL, LectureSlot::ALL);
        Occupancy {
            teachers: cells().map(|cell| (cell, HashSet::new())).collect(),
            rooms: cells().map(|cell| (cell, HashSet::new())).collect(),
            load: teachers.iter().map(|t| (t.id, 0)).collect(),
        }
    }

    fn load(&self, teacher: TeacherId) -> u32 {
        self.load.get(&teacher).copied().unwrap_or(0)
    }

    fn teacher_busy(&self, cell: Cell, teacher: TeacherId) -> bool {
        self.teachers
            .get(&cell)
            .is_some_and(|busy| busy.contains(&teacher))
    }

    fn room_busy(&self, cell: Cell, room: RoomId) -> bool {
        self.rooms.get(&cell).is_some_and(|busy| busy.contains(&room))
    }

    fn book(&mut self, cell: Cell, teacher: Option<TeacherId>, room: RoomId) {
        if let Some(teacher) = teacher {
            self.teachers.entry(cell).or_default().insert(teacher);
            *self.load.entry(teacher).or_insert(0) += 1;
        }
        self.rooms.entry(cell).or_default().insert(room);
    }
}

impl GenerationRequest {
    pub fn generate(&self) -> GenerationOutput {
        generate_timetable(
            &self.courses,
            &self.teachers,
            &self.rooms,
            self.department.as_deref(),
        )
    }
}

/// Builds a clash-free weekly grid by first-fit greedy placement.
///
/// Courses are placed in the order given. Each lecture hour goes into the
/// first empty (day, slot) cell, scanning days in week order and slots in
/// day order, where the course's teacher is free and at least one room is
/// free; the first free room in `rooms` is taken. A teacher never receives
/// more than [`MAX_LECTURES_PER_TEACHER`] hours in one run.
///
/// The function never fails. Hours that could not be placed are reported in
/// [`GenerationOutput::shortfalls`].
pub fn generate_timetable(
    courses: &[Course],
    teachers: &[Teacher],
    rooms: &[Room],
    department: Option<&str>,
) -> GenerationOutput {
    let start_time = Instant::now();

    let (target_courses, department_fallback) = select_courses(courses, department);

    // lookups
    let teacher_map: HashMap<TeacherId, &Teacher> = teachers.iter().map(|t| (t.id, t)).collect();
    let fallback_rooms = [Room::placeholder()];
    let room_list: &[Room] = if rooms.is_empty() {
        info!("No rooms registered, placing lectures in {}", fallback_rooms[0].name);
        &fallback_rooms
    } else {
        rooms
    };

    info!(
        "Generating timetable for {} courses, {} teachers and {} rooms...",
        target_courses.len(),
        teachers.len(),
        room_list.len()
    );

    let mut grid = WeeklyGrid::empty();
    let mut occupancy = Occupancy::new(teachers);
    let mut shortfalls = Vec::new();

    for course in target_courses {
        let teacher = course
            .assigned_teacher()
            .and_then(|id| teacher_map.get(&id).copied());
        let declared = course.required_hours();

        let target = match teacher {
            Some(t) => {
                let quota = MAX_LECTURES_PER_TEACHER.saturating_sub(occupancy.load(t.id));
                declared.min(quota)
            }
            None => declared,
        };

        let placed = if target > 0 {
            place_course(course, teacher, target, room_list, &mut grid, &mut occupancy)
        } else {
            0
        };

        let reason = if placed < target {
            warn!(
                "Could not place all hours for {}, placed {}/{}",
                course.report_label(),
                placed,
                target
            );
            Some(ShortfallReason::NoFreeSlot)
        } else if target < declared {
            trace!(
                "Teacher cap limits {} to {}/{} hours",
                course.report_label(),
                target,
                declared
            );
            Some(ShortfallReason::TeacherCapReached)
        } else {
            None
        };

        if let Some(reason) = reason {
            shortfalls.push(Shortfall {
                course_id: course.id,
                course: course.report_label(),
                declared,
                target,
                placed,
                reason,
            });
        }
    }

    info!(
        "Timetable generated in {:.2?}: {} placements, {} courses short",
        start_time.elapsed(),
        grid.placements().count(),
        shortfalls.len()
    );

    GenerationOutput {
        grid,
        department_fallback,
        shortfalls,
    }
}

// Department filter with fail-open fallback to every course.
fn select_courses<'a>(
    courses: &'a [Course],
    department: Option<&str>,
) -> (Vec<&'a Course>, bool) {
    // blank filters mean "all"; otherwise the filter is compared as given
    let Some(department) = department.filter(|d| !d.trim().is_empty()) else {
        return (courses.iter().collect(), false);
    };

    let department_lower = department.to_lowercase();
    let matched: Vec<&Course> = courses
        .iter()
        .filter(|c| c.in_department(&department_lower))
        .collect();

    if matched.is_empty() {
        warn!(
            "No courses found for department {department}, scheduling all {} courses",
            courses.len()
        );
        (courses.iter().collect(), true)
    } else {
        (matched, false)
    }
}

// Places up to `target` hours and returns how many were placed.
fn place_course(
    course: &Course,
    teacher: Option<&Teacher>,
    target: u32,
    room_list: &[Room],
    grid: &mut WeeklyGrid,
    occupancy: &mut Occupancy,
) -> u32 {
    let teacher_id = teacher.map(|t| t.id);
    let teacher_name = teacher.map_or(UNASSIGNED_TEACHER, |t| t.name.as_str());
    let subject = course.subject_label();
    let mut placed = 0;

    while placed < target {
        let mut placed_this_pass = false;

        for cell in iproduct!(Day::ALL, LectureSlot::ALL) {
            let (day, slot) = cell;
            if !grid.is_free(day, slot) {
                continue;
            }
            if teacher_id.is_some_and(|id| occupancy.teacher_busy(cell, id)) {
                continue;
            }
            let Some(room) = room_list.iter().find(|r| !occupancy.room_busy(cell, r.id)) else {
                continue;
            };

            grid.place(day, slot, format!("{subject} – {teacher_name} ({})", room.name));
            occupancy.book(cell, teacher_id, room.id);
            trace!("Placed {} on {} {} in {}", course.report_label(), day, slot, room.name);

            placed += 1;
            placed_this_pass = true;
            if placed >= target {
                break;
            }
        }

        // a pass without progress means the week is exhausted for this course
        if !placed_this_pass {
            break;
        }
    }

    placed
}
