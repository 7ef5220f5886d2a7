use ethers::types::Bytes;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::TaskRequest;
use crate::engine::Performer;

/// 任务被拒绝 / 输入无法解析时写回的行
#[derive(Debug, Serialize)]
struct ErrorLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<Bytes>,
    error: String,
}

/// 本地宿主：每行一个 JSON TaskRequest，每行输出一个 JSON 结果
/// 返回处理成功的任务数
pub async fn serve<P, R, W>(performer: &P, input: R, mut output: W) -> std::io::Result<usize>
where
    P: Performer + ?Sized,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let task: TaskRequest = match serde_json::from_str(line) {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(error = %e, "⚠️ [TaskStream] Dropping unparsable task line");
                let line = ErrorLine {
                    task_id: None,
                    error: e.to_string(),
                };
                write_line(&mut output, &line).await?;
                continue;
            }
        };

        // handle_task 自己先做校验，校验失败不会计算也不会上链
        let task_id = task.task_id.clone();
        match performer.handle_task(task).await {
            Ok(response) => {
                write_line(&mut output, &response).await?;
                handled += 1;
            }
            Err(e) => {
                write_line(
                    &mut output,
                    &ErrorLine {
                        task_id: Some(task_id),
                        error: e.to_string(),
                    },
                )
                .await?;
            }
        }
    }

    output.flush().await?;
    Ok(handled)
}

async fn write_line<W, T>(output: &mut W, value: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut encoded = serde_json::to_vec(value)?;
    encoded.push(b'\n');
    output.write_all(&encoded).await
}
