// Schedule Repository Port (Interface)
//
// Persistence collaborator used by the lifecycle services.

use crate::domain::{
    Appointment, AppointmentDraft, AppointmentId, AvailabilityDraft, AvailabilityId,
    AvailabilityWindow, MeetingPoint, MeetingPointId, UnavailabilityDraft, UnavailabilityId,
    UnavailabilityWindow, User, UserId,
};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for schedule persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Find instructor or student by ID
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    /// Find meeting point by ID
    async fn find_meeting_point(&self, id: MeetingPointId) -> Result<Option<MeetingPoint>>;

    async fn find_availability(&self, id: AvailabilityId) -> Result<Option<AvailabilityWindow>>;

    /// Insert a validated availability and return it with its new ID
    async fn insert_availability(&self, draft: &AvailabilityDraft) -> Result<AvailabilityWindow>;

    async fn update_availability(&self, window: &AvailabilityWindow) -> Result<()>;

    async fn delete_availability(&self, id: AvailabilityId) -> Result<()>;

    async fn find_unavailability(
        &self,
        id: UnavailabilityId,
    ) -> Result<Option<UnavailabilityWindow>>;

    /// Insert a validated unavailability and return it with its new ID
    async fn insert_unavailability(
        &self,
        draft: &UnavailabilityDraft,
    ) -> Result<UnavailabilityWindow>;

    async fn update_unavailability(&self, window: &UnavailabilityWindow) -> Result<()>;

    async fn delete_unavailability(&self, id: UnavailabilityId) -> Result<()>;

    async fn find_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>>;

    /// Insert a validated appointment and return it with its new ID
    async fn insert_appointment(&self, draft: &AppointmentDraft) -> Result<Appointment>;

    async fn update_appointment(&self, appointment: &Appointment) -> Result<()>;

    async fn delete_appointment(&self, id: AppointmentId) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::{Instructor, InstructorId, Student, TimeInterval};
    use crate::error::{AppError, EntityKind};
    use crate::port::{ConflictQueryPort, IntervalRecord};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        users: HashMap<UserId, User>,
        meeting_points: HashMap<MeetingPointId, MeetingPoint>,
        availabilities: BTreeMap<AvailabilityId, AvailabilityWindow>,
        unavailabilities: BTreeMap<UnavailabilityId, UnavailabilityWindow>,
        appointments: BTreeMap<AppointmentId, Appointment>,
        next_id: i64,
        writes: usize,
    }

    impl State {
        fn allocate_id(&mut self) -> i64 {
            self.next_id += 1;
            self.next_id
        }
    }

    /// In-memory schedule store implementing both data ports
    #[derive(Default)]
    pub struct InMemorySchedule {
        state: Mutex<State>,
    }

    impl InMemorySchedule {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_instructor(&self, id: InstructorId) {
            self.state.lock().unwrap().users.insert(
                id,
                User::Instructor(Instructor {
                    id,
                    first_name: format!("Instructor{}", id),
                    last_name: "Test".to_string(),
                    email: format!("instructor{}@example.com", id),
                    siret: format!("{:014}", id),
                }),
            );
        }

        pub fn add_student(&self, id: UserId) {
            self.state.lock().unwrap().users.insert(
                id,
                User::Student(Student {
                    id,
                    first_name: format!("Student{}", id),
                    last_name: "Test".to_string(),
                    email: format!("student{}@example.com", id),
                    neph: format!("{:012}", id),
                }),
            );
        }

        pub fn add_meeting_point(&self, id: MeetingPointId) {
            self.state.lock().unwrap().meeting_points.insert(
                id,
                MeetingPoint {
                    id,
                    name: format!("Point {}", id),
                    address: "1 rue de la Gare".to_string(),
                },
            );
        }

        /// Store a window as-is, bypassing validation (fixture setup)
        pub fn seed_availability(&self, window: AvailabilityWindow) {
            let mut state = self.state.lock().unwrap();
            state.next_id = state.next_id.max(window.id);
            state.availabilities.insert(window.id, window);
        }

        pub fn seed_unavailability(&self, window: UnavailabilityWindow) {
            let mut state = self.state.lock().unwrap();
            state.next_id = state.next_id.max(window.id);
            state.unavailabilities.insert(window.id, window);
        }

        pub fn seed_appointment(&self, appointment: Appointment) {
            let mut state = self.state.lock().unwrap();
            state.next_id = state.next_id.max(appointment.id);
            state.appointments.insert(appointment.id, appointment);
        }

        /// Number of insert/update/delete calls served
        pub fn write_count(&self) -> usize {
            self.state.lock().unwrap().writes
        }

        pub fn appointment_count(&self) -> usize {
            self.state.lock().unwrap().appointments.len()
        }
    }

    fn matching<I>(
        entries: I,
        instructor_id: InstructorId,
        overlapping: &TimeInterval,
        exclude_id: Option<i64>,
    ) -> Vec<IntervalRecord>
    where
        I: Iterator<Item = (i64, InstructorId, TimeInterval)>,
    {
        entries
            .filter(|(id, owner, interval)| {
                *owner == instructor_id
                    && Some(*id) != exclude_id
                    && interval.overlaps(overlapping)
            })
            .map(|(id, _, interval)| IntervalRecord { id, interval })
            .collect()
    }

    #[async_trait]
    impl ConflictQueryPort for InMemorySchedule {
        async fn find_availabilities(
            &self,
            instructor_id: InstructorId,
            overlapping: &TimeInterval,
            exclude_id: Option<AvailabilityId>,
        ) -> Result<Vec<IntervalRecord>> {
            let state = self.state.lock().unwrap();
            Ok(matching(
                state
                    .availabilities
                    .values()
                    .map(|w| (w.id, w.instructor_id, w.interval)),
                instructor_id,
                overlapping,
                exclude_id,
            ))
        }

        async fn find_unavailabilities(
            &self,
            instructor_id: InstructorId,
            overlapping: &TimeInterval,
            exclude_id: Option<UnavailabilityId>,
        ) -> Result<Vec<IntervalRecord>> {
            let state = self.state.lock().unwrap();
            Ok(matching(
                state
                    .unavailabilities
                    .values()
                    .map(|w| (w.id, w.instructor_id, w.interval)),
                instructor_id,
                overlapping,
                exclude_id,
            ))
        }

        async fn find_confirmed_appointments(
            &self,
            instructor_id: InstructorId,
            overlapping: &TimeInterval,
        ) -> Result<Vec<IntervalRecord>> {
            let state = self.state.lock().unwrap();
            Ok(matching(
                state
                    .appointments
                    .values()
                    .filter(|a| a.is_confirmed())
                    .map(|a| (a.id, a.instructor_id, a.interval)),
                instructor_id,
                overlapping,
                None,
            ))
        }
    }

    #[async_trait]
    impl ScheduleRepository for InMemorySchedule {
        async fn find_user(&self, id: UserId) -> Result<Option<User>> {
            Ok(self.state.lock().unwrap().users.get(&id).cloned())
        }

        async fn find_meeting_point(&self, id: MeetingPointId) -> Result<Option<MeetingPoint>> {
            Ok(self.state.lock().unwrap().meeting_points.get(&id).cloned())
        }

        async fn find_availability(
            &self,
            id: AvailabilityId,
        ) -> Result<Option<AvailabilityWindow>> {
            Ok(self.state.lock().unwrap().availabilities.get(&id).cloned())
        }

        async fn insert_availability(
            &self,
            draft: &AvailabilityDraft,
        ) -> Result<AvailabilityWindow> {
            let mut state = self.state.lock().unwrap();
            let window = draft.clone().into_window(state.allocate_id());
            state.availabilities.insert(window.id, window.clone());
            state.writes += 1;
            Ok(window)
        }

        async fn update_availability(&self, window: &AvailabilityWindow) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if !state.availabilities.contains_key(&window.id) {
                return Err(AppError::not_found(EntityKind::Availability, window.id));
            }
            state.availabilities.insert(window.id, window.clone());
            state.writes += 1;
            Ok(())
        }

        async fn delete_availability(&self, id: AvailabilityId) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.availabilities.remove(&id).is_none() {
                return Err(AppError::not_found(EntityKind::Availability, id));
            }
            state.writes += 1;
            Ok(())
        }

        async fn find_unavailability(
            &self,
            id: UnavailabilityId,
        ) -> Result<Option<UnavailabilityWindow>> {
            Ok(self.state.lock().unwrap().unavailabilities.get(&id).cloned())
        }

        async fn insert_unavailability(
            &self,
            draft: &UnavailabilityDraft,
        ) -> Result<UnavailabilityWindow> {
            let mut state = self.state.lock().unwrap();
            let window = draft.clone().into_window(state.allocate_id());
            state.unavailabilities.insert(window.id, window.clone());
            state.writes += 1;
            Ok(window)
        }

        async fn update_unavailability(&self, window: &UnavailabilityWindow) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if !state.unavailabilities.contains_key(&window.id) {
                return Err(AppError::not_found(EntityKind::Unavailability, window.id));
            }
            state.unavailabilities.insert(window.id, window.clone());
            state.writes += 1;
            Ok(())
        }

        async fn delete_unavailability(&self, id: UnavailabilityId) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.unavailabilities.remove(&id).is_none() {
                return Err(AppError::not_found(EntityKind::Unavailability, id));
            }
            state.writes += 1;
            Ok(())
        }

        async fn find_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>> {
            Ok(self.state.lock().unwrap().appointments.get(&id).cloned())
        }

        async fn insert_appointment(&self, draft: &AppointmentDraft) -> Result<Appointment> {
            let mut state = self.state.lock().unwrap();
            let appointment = draft.clone().into_appointment(state.allocate_id());
            state.appointments.insert(appointment.id, appointment.clone());
            state.writes += 1;
            Ok(appointment)
        }

        async fn update_appointment(&self, appointment: &Appointment) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if !state.appointments.contains_key(&appointment.id) {
                return Err(AppError::not_found(EntityKind::Appointment, appointment.id));
            }
            state.appointments.insert(appointment.id, appointment.clone());
            state.writes += 1;
            Ok(())
        }

        async fn delete_appointment(&self, id: AppointmentId) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.appointments.remove(&id).is_none() {
                return Err(AppError::not_found(EntityKind::Appointment, id));
            }
            state.writes += 1;
            Ok(())
        }
    }
}
