//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads that
//! are also needed inside a transaction accept any `PgExecutor`; multi-step
//! writes accept `&mut PgConnection`.

pub mod booking_repo;
pub mod course_repo;
pub mod master_package_repo;
pub mod purchased_package_repo;
pub mod schedule_repo;
pub mod scheduling_repo;

pub use booking_repo::BookingRepo;
pub use course_repo::CourseRepo;
pub use master_package_repo::MasterPackageRepo;
pub use purchased_package_repo::PurchasedPackageRepo;
pub use schedule_repo::ScheduleRepo;
pub use scheduling_repo::SchedulingRepo;
