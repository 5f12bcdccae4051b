#[macro_use]
extern crate log;

use getopts::Options;
use microstat::{Key, Sampler};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

pub fn opts() -> Options {
    let mut opts = Options::new();

    opts.optopt("p", "producers", "number of producer threads", "INTEGER");
    opts.optopt("s", "stripes", "stripes per distribution", "INTEGER");
    opts.optopt("d", "duration", "seconds to run for", "INTEGER");
    opts.optflag("h", "help", "print this help menu");

    opts
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = &args[0];
    let opts = opts();

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            error!("failed to parse command line args: {}", f);
            return;
        }
    };

    if matches.opt_present("help") {
        print_usage(program, &opts);
        return;
    }

    info!("microstat benchmark");

    let producers: usize = matches
        .opt_str("producers")
        .unwrap_or_else(|| "4".to_owned())
        .parse()
        .unwrap();
    let stripes: usize = matches
        .opt_str("stripes")
        .unwrap_or_else(|| num_cpus::get().to_string())
        .parse()
        .unwrap();
    let seconds: u64 = matches
        .opt_str("duration")
        .unwrap_or_else(|| "30".to_owned())
        .parse()
        .unwrap();

    info!("producers: {}", producers);
    info!("stripes: {}", stripes);
    info!("duration: {}s", seconds);

    let mut sampler = Sampler::builder()
        .stripe_count(stripes)
        .sample_interval(Duration::from_secs(1))
        .build();

    let registry = sampler.registry();
    let controller = sampler.controller();

    // Hammer one distribution and one counter from every producer.
    for p in 0..producers {
        let latency = registry.distribution(Key::from_name("latency"));
        let total = registry.counter(Key::from_name("total"));
        thread::spawn(move || {
            let mut value = p as f64;
            loop {
                value = (value * 31.0 + 1.0) % 1_000.0;
                latency.add(value);
                total.increment();
            }
        });
    }

    thread::spawn(move || sampler.run());

    // Poll the controller once a second and report the observation rate.
    let mut last_count = 0;
    let mut t0 = Instant::now();
    for _ in 0..seconds {
        thread::sleep(Duration::from_secs(1));

        let t1 = Instant::now();
        let snapshot = controller.snapshot().unwrap();
        let stats = snapshot
            .distribution(&Key::from_name("latency"))
            .expect("latency distribution should be registered");

        let delta = stats.count - last_count;
        last_count = stats.count;
        let rate = delta as f64 / (t1 - t0).as_secs_f64();
        t0 = t1;

        info!("rate: {:.0} observations per second", rate);
        info!(
            "latency: mean {:.3} stddev {:.3} min {:.3} max {:.3}",
            stats.mean,
            stats.std_dev(),
            stats.min,
            stats.max
        );
    }

    info!("total observations recorded: {}", last_count);
}
