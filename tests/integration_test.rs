use std::cell::RefCell;
use std::collections::VecDeque;

use l3probe::instant::InstantTimer;
use l3probe::timer::DurationTimer;
use l3probe::util::{PAGE_SIZE, Size};
use l3probe::{CacheProber, EvictionBuffer, ProbeConfig};

/// Replays a fixed sequence of tick values, one per `now()` call.
struct ScriptedTimer {
    ticks: RefCell<VecDeque<u64>>,
}

impl ScriptedTimer {
    fn new(ticks: impl IntoIterator<Item = u64>) -> Self {
        ScriptedTimer {
            ticks: RefCell::new(ticks.into_iter().collect()),
        }
    }
}

impl DurationTimer for ScriptedTimer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn now(&self) -> u64 {
        self.ticks
            .borrow_mut()
            .pop_front()
            .expect("scripted timer ran out of ticks")
    }

    fn tick_nanos(&self) -> f64 {
        1.0
    }
}

#[test]
fn test_single_round_reference_buffer() -> anyhow::Result<()> {
    let config = ProbeConfig {
        rounds: 1,
        buffer_size: 8192 * 1024,
        stride: 64,
        keep_samples: true,
        ..Default::default()
    };
    let timer = ScriptedTimer::new([0, 300, 300, 340, 340, 380, 1000, 1290]);
    let mut prober = CacheProber::builder()
        .timer(Box::new(timer))
        .config(config)
        .build()?;
    let data = prober.run();

    assert_eq!(prober.eviction().reads(), (8192 * 1023) / 64);
    assert_eq!(data.accesses.sweeps, 2);
    assert_eq!(data.accesses.eviction_reads, 2 * ((8192 * 1023) / 64));
    assert_eq!(data.accesses.probe_reads, 4);

    assert!(data.result.is_well_formed());
    let samples = data.samples.expect("samples requested");
    assert_eq!(samples.len(), 1);
    assert_eq!(data.result.flushed_average, samples[0].first);
    assert_eq!(data.result.unflushed_average, samples[0].second);
    assert_eq!(data.result.unflushed_control_average, samples[0].third);
    assert_eq!(data.result.flushed_control_average, samples[0].fourth);
    assert_eq!(data.result.flushed_average, 300.0);
    assert_eq!(data.result.unflushed_average, 40.0);
    assert_eq!(data.result.unflushed_control_average, 40.0);
    assert_eq!(data.result.flushed_control_average, 290.0);
    Ok(())
}

#[test]
fn test_averages_map_reads_to_fields() -> anyhow::Result<()> {
    let ticks = [
        0, 100, 100, 110, 110, 125, 200, 290, // round 1
        0, 300, 0, 20, 0, 25, 0, 110, // round 2
    ];
    let mut prober = CacheProber::builder()
        .timer(Box::new(ScriptedTimer::new(ticks)))
        .config(ProbeConfig {
            rounds: 2,
            buffer_size: 64 * PAGE_SIZE,
            ..Default::default()
        })
        .build()?;
    let result = prober.run().result;
    assert_eq!(result.flushed_average, 200.0);
    assert_eq!(result.unflushed_average, 15.0);
    assert_eq!(result.unflushed_control_average, 20.0);
    assert_eq!(result.flushed_control_average, 100.0);
    assert!(result.is_ordered());
    Ok(())
}

#[test]
fn test_uneven_stride_sweeps_in_bounds() -> anyhow::Result<()> {
    let len = Size::KB(8192).bytes();
    let mut prober = CacheProber::builder()
        .timer(Box::new(InstantTimer::new()))
        .config(ProbeConfig {
            rounds: 2,
            buffer_size: len,
            stride: 96,
            ..Default::default()
        })
        .build()?;
    let reads = prober.eviction().reads();
    assert_eq!(reads, EvictionBuffer::sweep_reads(len, 96));
    assert!((reads - 1) * 96 + 4 <= len);
    let data = prober.run();
    assert_eq!(data.accesses.eviction_reads, 4 * reads as u64);
    assert!(data.result.is_well_formed());
    Ok(())
}

#[test]
fn test_instant_timer_smoke() -> anyhow::Result<()> {
    let mut prober = CacheProber::builder()
        .timer(Box::new(InstantTimer::new()))
        .config(ProbeConfig {
            rounds: 10,
            buffer_size: Size::KB(64).bytes(),
            ..Default::default()
        })
        .build()?;
    let data = prober.run();
    assert_eq!(data.timer, "instant");
    assert!(data.result.is_well_formed());
    assert_eq!(data.accesses.probe_reads, 40);
    Ok(())
}

#[test]
fn test_report_json_layout() -> anyhow::Result<()> {
    let mut prober = CacheProber::builder()
        .timer(Box::new(InstantTimer::new()))
        .config(ProbeConfig {
            rounds: 1,
            buffer_size: 4 * PAGE_SIZE,
            ..Default::default()
        })
        .build()?;
    let json = serde_json::to_value(prober.run())?;
    let result = json["result"].as_object().expect("result object");
    assert_eq!(result.len(), 4);
    for key in [
        "flushedAverage",
        "unflushedAverage",
        "flushedControlAverage",
        "unflushedControlAverage",
    ] {
        assert!(result[key].as_f64().is_some_and(|v| v >= 0.0), "{}", key);
    }
    assert!(json.get("samples").is_none());
    assert_eq!(json["config"]["rounds"], 1);
    assert_eq!(json["accesses"]["sweeps"], 2);
    Ok(())
}

#[test]
fn test_config_from_jsonfile() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!("l3probe-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"rounds": 3, "buffer_size": 65536, "stride": 128}"#)?;
    let config = ProbeConfig::from_jsonfile(&path);
    std::fs::remove_file(&path)?;
    let config = config?;
    assert_eq!(config.rounds, 3);
    assert_eq!(config.buffer_size, 65536);
    assert_eq!(config.stride, 128);
    assert_eq!(config.probe_offset, 4);
    Ok(())
}

#[test]
fn test_invalid_offset_is_rejected_before_allocation() {
    let result = CacheProber::builder()
        .timer(Box::new(InstantTimer::new()))
        .config(ProbeConfig {
            buffer_size: PAGE_SIZE,
            probe_offset: PAGE_SIZE,
            ..Default::default()
        })
        .build();
    assert!(matches!(result, Err(l3probe::Error::InvalidConfig(_))));
}

/// Needs an idle machine with a real cache hierarchy.
#[test]
#[ignore]
fn test_evicted_reads_are_slower() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut ordered = 0;
    let mut comparable = 0;
    const REPETITIONS: usize = 5;
    const MAX_CONTROL_DEVIATION: f64 = 0.5;
    for _ in 0..REPETITIONS {
        let mut prober = CacheProber::builder()
            .timer(Box::new(InstantTimer::new()))
            .config(ProbeConfig::default())
            .build()?;
        let result = prober.run().result;
        assert!(result.is_well_formed());
        if result.is_ordered() {
            ordered += 1;
        }
        let deviation = result.control_deviation();
        println!("{:?} {:?}", result, deviation);
        if deviation.warm < MAX_CONTROL_DEVIATION && deviation.cold < MAX_CONTROL_DEVIATION {
            comparable += 1;
        }
    }
    assert!(
        ordered * 2 > REPETITIONS,
        "only {}/{} runs ordered",
        ordered,
        REPETITIONS
    );
    assert!(
        comparable * 2 > REPETITIONS,
        "control reads matched the primary reads in only {}/{} runs",
        comparable,
        REPETITIONS
    );
    Ok(())
}
