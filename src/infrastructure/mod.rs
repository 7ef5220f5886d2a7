pub mod task_stream;
