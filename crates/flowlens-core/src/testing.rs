use crate::units::{Nanosecs, TimeWindow};

pub(crate) fn window() -> TimeWindow {
    TimeWindow::new(Nanosecs::new(2_000_000_000), Nanosecs::new(3_000_000_000))
}

/// Four in-window flows (sizes 100/200/2000/4000, slowdowns 1/1/2/4), one
/// flow outside the window, and one malformed line.
pub(crate) fn fct_log() -> String {
    let mut lines = vec![
        "0 1 10000 100 4000 2000000100 80000 20000".to_string(),
        "0 1 10000 100 100 2000000100 10000 10000".to_string(),
        "0 1 10000 100 2000 2000000100 40000 20000".to_string(),
        "0 1 10000 100 200 2000000100 20000 20000".to_string(),
        // Finished before the analysis window opened.
        "0 1 10000 100 300 1000000000 10000 10000".to_string(),
        "this line is garbage".to_string(),
    ];
    lines.push(String::new());
    lines.join("\n")
}

/// Queue occupancy samples from two switches inside the analysis window,
/// plus one out-of-window sample and one malformed line.
pub(crate) fn queue_log() -> String {
    [
        "2000010000,0,2,10",
        "2000020000,0,3,20",
        "2000010000,1,1,5",
        "1000000000,1,9,99",
        "not,a,sample",
        "",
    ]
    .join("\n")
}
