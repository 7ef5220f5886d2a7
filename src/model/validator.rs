use crate::core::TaskRequest;
use crate::error::TaskError;

/// 任务前置检查 (Pre-Task Check)
/// 返回 Err 时宿主不能调用 handle_task，也不会有响应
pub fn validate_task(task: &TaskRequest) -> Result<(), TaskError> {
    tracing::info!(task_id = %task.task_id, "🔍 Validating LST rebalance task");

    if task.task_id.is_empty() {
        tracing::warn!("🛡️ [VALIDATE REJECT] Task has no ID");
        return Err(TaskError::MissingTaskId);
    }

    tracing::info!(task_id = %task.task_id, "✅ Task validation passed");
    Ok(())
}
