use crate::core::TickShift;

/// 收益信号 (bps) -> tick 偏移量
///
/// 1 bp 直接当作 1 tick。真正的价格 tick 是 log_{1.0001}(收益乘数)，
/// 但浮点对数在不同平台上可能不一致，多个 operator 必须算出逐位相同的结果，
/// 所以这里只用整数运算。
pub fn compute_tick_shift(yield_bps: u64) -> TickShift {
    // 超过 i64::MAX 的输入先饱和，不能像 `as` 那样回绕成负数
    let signal = i64::try_from(yield_bps).unwrap_or(i64::MAX);
    compute_signed_tick_shift(signal)
}

/// 有符号版本：负收益 (亏损) 场景会向下截断到 -1000
pub fn compute_signed_tick_shift(signal: i64) -> TickShift {
    tracing::debug!(yield_signal = signal, calculated_shift = signal, "📐 Calculating tick shift");

    let shift = TickShift::clamped(signal);
    if i64::from(shift.get()) != signal {
        tracing::warn!(
            original = signal,
            capped = shift.get(),
            "Tick shift capped at {}",
            if signal > 0 { "maximum" } else { "minimum" }
        );
    }

    tracing::debug!(final_shift = shift.get(), "📈 Final tick shift");
    shift
}
