//! Игровой clock — frame-rate-independent время для всех подсистем
//!
//! Архитектура:
//! - Монотонный tick source (`TickSource`) → elapsed seconds
//! - Ring buffer последних N deltas → сглаженный delta (`delta_time`)
//! - FPS estimate обновляется раз в 0.5 сек, не каждый кадр
//!
//! Почему сглаживание: raw per-frame delta шумный (OS scheduling jitter).
//! Все игровые таймеры (cadence бросков, stun windows) считаются от
//! accumulated smoothed delta, не от wall-clock polling.

use bevy::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// FPS пересчитывается не чаще чем раз в этот интервал (simulated seconds)
pub const FPS_REFRESH_INTERVAL: f32 = 0.5;

/// Размер окна сглаживания delta time
///
/// `Tight` (1 sample) — отзывчивость для разработки/отладки,
/// `Wide` (5 samples) — сглаживание jitter для release-геймплея.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum SmoothingWindow {
    Tight,
    Wide,
}

impl SmoothingWindow {
    pub const fn len(self) -> usize {
        match self {
            SmoothingWindow::Tight => 1,
            SmoothingWindow::Wide => 5,
        }
    }
}

/// Конфигурация clock (передаётся при конструировании, не compile-time switch)
#[derive(Debug, Clone, Copy)]
pub struct ClockConfig {
    pub smoothing: SmoothingWindow,
    /// Считать ли FPS (нужен только clock'у главного цикла)
    pub track_fps: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingWindow::Wide,
            track_fps: false,
        }
    }
}

/// Монотонный источник тиков
///
/// Продакшн — `MonotonicTicks` (std Instant). Тесты и lockstep-харнессы —
/// `ManualTicks` (продвигается вручную, полностью детерминирован).
pub trait TickSource: Send + Sync {
    fn ticks(&self) -> u64;
    fn ticks_per_second(&self) -> u64;
}

/// Платформенный монотонный источник (наносекундные тики от старта процесса)
pub struct MonotonicTicks {
    origin: Instant,
}

impl MonotonicTicks {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicTicks {
    fn ticks(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn ticks_per_second(&self) -> u64 {
        1_000_000_000
    }
}

/// Ручной источник тиков (микросекундные тики, shared handle)
///
/// Clone'ы делят один счётчик — тест держит handle и двигает время,
/// пока clock внутри симуляции его читает.
#[derive(Clone, Default)]
pub struct ManualTicks {
    ticks: Arc<AtomicU64>,
}

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Продвинуть время на `seconds` вперёд
    pub fn advance(&self, seconds: f32) {
        let micros = (seconds as f64 * 1_000_000.0).round() as u64;
        self.ticks.fetch_add(micros, Ordering::SeqCst);
    }
}

impl TickSource for ManualTicks {
    fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn ticks_per_second(&self) -> u64 {
        1_000_000
    }
}

/// Игровой clock
///
/// Один instance шарится подсистемами которым нужно синхронное "сейчас";
/// каждый instance держит собственный smoothing buffer, так что общий clock
/// централизует время, но не сглаживание.
#[derive(Resource)]
pub struct Clock {
    source: Box<dyn TickSource>,
    resolution: f64, // seconds per tick

    running: bool,
    base_ticks: u64,
    /// Elapsed ticks, замороженные на момент stop()
    stopped_ticks: u64,

    offset: f32,

    frame_time: f32,
    last_time: f32,

    samples: Vec<f32>,
    cursor: usize,

    track_fps: bool,
    frame_count: u32,
    last_fps_refresh: f32,
    fps: f32,
}

impl Clock {
    pub fn new(config: ClockConfig) -> Self {
        Self::with_source(config, Box::new(MonotonicTicks::new()))
    }

    pub fn with_source(config: ClockConfig, source: Box<dyn TickSource>) -> Self {
        let resolution = 1.0 / source.ticks_per_second() as f64;
        Self {
            source,
            resolution,
            running: false,
            base_ticks: 0,
            stopped_ticks: 0,
            offset: 0.0,
            frame_time: 0.0,
            last_time: 0.0,
            samples: vec![0.0; config.smoothing.len()],
            cursor: 0,
            track_fps: config.track_fps,
            frame_count: 0,
            last_fps_refresh: 0.0,
            fps: 0.0,
        }
    }

    /// Запустить отсчёт. Повторный start — no-op (идемпотентно).
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.base_ticks = self.source.ticks();
        self.running = true;
    }

    /// Заморозить elapsed time. Повторный stop — no-op.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.stopped_ticks = self.source.ticks().saturating_sub(self.base_ticks);
        self.running = false;
    }

    /// Продолжить с точки останова: база сдвигается так, что elapsed
    /// накапливается без скачка за паузу.
    pub fn resume(&mut self) {
        if self.running {
            return;
        }
        self.base_ticks = self.source.ticks().saturating_sub(self.stopped_ticks);
        self.running = true;
    }

    /// Переинициализировать все аккумуляторы в сконструированное состояние.
    /// После reset clock остановлен — нужен `start()`.
    pub fn reset(&mut self) {
        self.running = false;
        self.base_ticks = 0;
        self.stopped_ticks = 0;
        self.frame_time = 0.0;
        self.last_time = 0.0;
        self.samples.fill(0.0);
        self.cursor = 0;
        self.frame_count = 0;
        self.last_fps_refresh = 0.0;
        self.fps = 0.0;
    }

    /// Один вызов на шаг симуляции. Не running — silent no-op.
    pub fn update(&mut self) {
        if !self.running {
            return;
        }

        let now = self.elapsed_running();
        // Инвариант: delta >= 0 (offset может сдвинуть время назад на один кадр)
        let frame = (now - self.last_time).max(0.0);
        self.frame_time = frame;
        self.last_time = now;

        self.samples[self.cursor] = frame;
        self.cursor = (self.cursor + 1) % self.samples.len();

        self.frame_count += 1;
        if self.track_fps {
            let since_refresh = now - self.last_fps_refresh;
            if since_refresh >= FPS_REFRESH_INTERVAL {
                self.fps = self.frame_count as f32 / since_refresh;
                self.frame_count = 0;
                self.last_fps_refresh = now;
            }
        }
    }

    /// Сглаженный delta — среднее по ring buffer.
    ///
    /// Именно это значение использует вся игровая логика для cadence
    /// и интеграции движения, НЕ сырой мгновенный delta.
    pub fn delta_time(&self) -> f32 {
        let sum: f32 = self.samples.iter().sum();
        sum / self.samples.len() as f32
    }

    /// Несглаженный delta последнего update
    pub fn frame_time(&self) -> f32 {
        self.frame_time
    }

    /// Абсолютное elapsed time (заморожено пока clock остановлен)
    pub fn actual_time(&self) -> f32 {
        if self.running {
            self.elapsed_running()
        } else {
            (self.stopped_ticks as f64 * self.resolution) as f32 + self.offset
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Постоянный сдвиг ко всему последующему reported времени
    /// (рассинхронизация или pre-advance instance'а относительно платформы).
    pub fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
    }

    fn elapsed_running(&self) -> f32 {
        let ticks = self.source.ticks().saturating_sub(self.base_ticks);
        (ticks as f64 * self.resolution) as f32 + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_clock(smoothing: SmoothingWindow, track_fps: bool) -> (Clock, ManualTicks) {
        let ticks = ManualTicks::new();
        let clock = Clock::with_source(
            ClockConfig {
                smoothing,
                track_fps,
            },
            Box::new(ticks.clone()),
        );
        (clock, ticks)
    }

    #[test]
    fn test_actual_time_monotonic_while_running() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Wide, false);
        clock.start();

        let mut last = clock.actual_time();
        for _ in 0..100 {
            ticks.advance(0.016);
            clock.update();
            let now = clock.actual_time();
            assert!(now >= last, "actual_time went backwards: {} < {}", now, last);
            last = now;
        }
    }

    #[test]
    fn test_stopped_time_is_frozen() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Wide, false);
        clock.start();
        ticks.advance(1.0);
        clock.update();

        clock.stop();
        let frozen = clock.actual_time();
        assert!((frozen - 1.0).abs() < 1e-4);

        // Время идёт — clock стоит
        ticks.advance(10.0);
        assert_eq!(clock.actual_time(), frozen);
        clock.update(); // no-op пока остановлен
        assert_eq!(clock.actual_time(), frozen);
    }

    #[test]
    fn test_resume_has_no_gap() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Tight, false);
        clock.start();
        ticks.advance(2.0);
        clock.update();
        clock.stop();
        let before_pause = clock.actual_time();

        // Пауза произвольной длины
        ticks.advance(500.0);
        clock.resume();

        assert!((clock.actual_time() - before_pause).abs() < 1e-4);

        // И дальше накапливается нормально
        ticks.advance(1.0);
        clock.update();
        assert!((clock.actual_time() - (before_pause + 1.0)).abs() < 1e-3);
        assert!((clock.frame_time() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_double_start_and_stop_idempotent() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Tight, false);
        clock.start();
        ticks.advance(1.0);
        clock.start(); // не сбрасывает базу
        clock.update();
        assert!((clock.actual_time() - 1.0).abs() < 1e-4);

        clock.stop();
        let frozen = clock.actual_time();
        ticks.advance(1.0);
        clock.stop(); // не перезахватывает stopped ticks
        assert_eq!(clock.actual_time(), frozen);
    }

    #[test]
    fn test_smoothed_delta_is_ring_buffer_mean() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Wide, false);
        clock.start();

        let deltas = [0.016, 0.017, 0.015, 0.016, 0.016];
        for d in deltas {
            ticks.advance(d);
            clock.update();
        }

        let mean: f32 = deltas.iter().sum::<f32>() / deltas.len() as f32;
        assert!((clock.delta_time() - mean).abs() < 1e-5);
        assert!((clock.delta_time() - 0.016).abs() < 5e-4);

        // Ещё один update вытесняет самый старый sample (0.016 → 0.040)
        ticks.advance(0.040);
        clock.update();
        let mean2 = (0.017 + 0.015 + 0.016 + 0.016 + 0.040) / 5.0;
        assert!((clock.delta_time() - mean2).abs() < 1e-5);
    }

    #[test]
    fn test_tight_window_tracks_instantaneous_delta() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Tight, false);
        clock.start();

        ticks.advance(0.016);
        clock.update();
        assert!((clock.delta_time() - 0.016).abs() < 1e-5);

        ticks.advance(0.033);
        clock.update();
        assert!((clock.delta_time() - 0.033).abs() < 1e-5);
    }

    #[test]
    fn test_fps_refreshes_only_at_interval_boundaries() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Tight, true);
        clock.start();

        assert_eq!(clock.fps(), 0.0);

        // 30 кадров по 0.01s = 0.3s — интервал 0.5s ещё не прошёл
        for _ in 0..30 {
            ticks.advance(0.01);
            clock.update();
        }
        assert_eq!(clock.fps(), 0.0, "FPS обновился раньше refresh-интервала");

        // Ещё 20 кадров → 0.5s, граница пройдена: 50 кадров / 0.5s = 100 FPS
        for _ in 0..20 {
            ticks.advance(0.01);
            clock.update();
        }
        assert!((clock.fps() - 100.0).abs() < 1.0, "fps = {}", clock.fps());

        // Сразу после refresh значение держится до следующей границы
        let fps_after_refresh = clock.fps();
        for _ in 0..10 {
            ticks.advance(0.01);
            clock.update();
        }
        assert_eq!(clock.fps(), fps_after_refresh);
    }

    #[test]
    fn test_fps_not_tracked_when_disabled() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Tight, false);
        clock.start();
        for _ in 0..200 {
            ticks.advance(0.01);
            clock.update();
        }
        assert_eq!(clock.fps(), 0.0);
    }

    #[test]
    fn test_offset_biases_reported_time() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Tight, false);
        clock.set_offset(10.0);
        clock.start();
        ticks.advance(1.0);
        clock.update();
        assert!((clock.actual_time() - 11.0).abs() < 1e-4);
    }

    #[test]
    fn test_delta_never_negative_after_offset_shift() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Tight, false);
        clock.set_offset(5.0);
        clock.start();
        ticks.advance(1.0);
        clock.update();

        // Сдвиг offset назад — следующий кадр был бы отрицательным без clamp
        clock.set_offset(0.0);
        ticks.advance(0.016);
        clock.update();
        assert!(clock.frame_time() >= 0.0);
        assert!(clock.delta_time() >= 0.0);
    }

    #[test]
    fn test_reset_reinitializes_accumulators() {
        let (mut clock, ticks) = manual_clock(SmoothingWindow::Wide, true);
        clock.start();
        for _ in 0..100 {
            ticks.advance(0.016);
            clock.update();
        }
        assert!(clock.delta_time() > 0.0);

        clock.reset();
        assert!(!clock.is_running());
        assert_eq!(clock.delta_time(), 0.0);
        assert_eq!(clock.frame_time(), 0.0);
        assert_eq!(clock.fps(), 0.0);
        assert_eq!(clock.actual_time(), 0.0);

        // После reset clock снова рабочий
        clock.start();
        ticks.advance(0.016);
        clock.update();
        assert!((clock.frame_time() - 0.016).abs() < 1e-4);
    }
}
