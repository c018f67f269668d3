use academy_core::error::CoreError;
use academy_core::types::DbId;
use academy_db::models::course::CourseSchedule;
use academy_db::repositories::{CourseRepo, ScheduleRepo};
use axum::extract::{Path, State};
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/courses/{id}/schedules
///
/// Active schedules of a course, for picking where to book.
pub async fn list_schedules(
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<CourseSchedule>>>> {
    CourseRepo::find_by_id(&state.pool, course_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Course",
            id: course_id,
        }))?;

    let schedules = ScheduleRepo::list_by_course(&state.pool, course_id).await?;
    Ok(Json(DataResponse { data: schedules }))
}
