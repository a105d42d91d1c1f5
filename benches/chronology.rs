use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use on_this_day::{videos_for_date, Catalogue, ChannelInfo, Config, DateExtractor, VideoRecord};

const TITLES: [&str; 6] = [
    "03/14/2019",
    "Road Trip - 03/14/2019",
    "Exploring the abandoned mall on March 14, 2019",
    "We found it 14 March 2019 in the desert",
    "Just a fun day!",
    "Invalid date 02/30/2020 then real 2/28/2020",
];

/// Benchmark title date extraction over the default chain
fn bench_extraction(c: &mut Criterion) {
    let extractor = DateExtractor::from_config(&Config::default().date_parsing);

    c.bench_function("extract_titles", |b| {
        b.iter(|| {
            for title in TITLES {
                black_box(extractor.extract(black_box(title)));
            }
        })
    });

    c.bench_function("build_extractor", |b| {
        b.iter(|| DateExtractor::new(black_box(["%m/%d/%Y", "%B %d, %Y"]), true))
    });
}

/// Benchmark day matching on a catalogue of ten years of daily uploads
fn bench_matching(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
    let records = (0..3650).map(|i| {
        let recorded = start + chrono::Duration::days(i);
        VideoRecord::new(format!("vid{}", i), format!("Day {}", i), recorded, Some(recorded))
    });
    let (catalogue, _) =
        Catalogue::from_records(ChannelInfo::placeholder("Chan", "@chan"), records);

    c.bench_function("videos_for_date", |b| {
        b.iter(|| videos_for_date(black_box(&catalogue), black_box(7), black_box(4)))
    });
}

criterion_group!(benches, bench_extraction, bench_matching);
criterion_main!(benches);
