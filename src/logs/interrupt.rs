// src/logs/interrupt.rs

//! Rendering of fatal interrupt records.
//!
//! Interrupt records are never handed to the renderer: describing which
//! module a half-created resource came from needs the local run options.

use crate::config::RunConfigLookup;
use crate::logs::record::{JsonLog, TestFailedResource, TestFatalInterrupt};
use crate::terminal::{word_wrap, Streams};

/// Print an interrupt record and the resources it left behind to stderr.
pub fn render_interrupt(
    streams: &Streams,
    lookup: &RunConfigLookup,
    log: &JsonLog,
    interrupt: &TestFatalInterrupt,
) {
    let columns = streams.columns();

    streams.eprintln(&word_wrap(&log.message, columns));

    if !interrupt.state.is_empty() {
        streams.eprint(&word_wrap(
            "\nTerraform has already created the following resources from the module under test:\n",
            columns,
        ));
        print_resources(streams, &interrupt.state);
    }

    for (run, resources) in &interrupt.states {
        streams.eprint(&word_wrap(
            &format!("\nTerraform has already created the following resources for {run:?}:\n"),
            columns,
        ));
        print_resources(streams, resources);
    }

    if !interrupt.planned.is_empty() {
        let module = lookup.module_label(&log.test_file, &log.test_run);
        streams.eprint(&word_wrap(
            &format!(
                "\nTerraform was in the process of creating the following resources for {:?} from {module}, and they may not have been destroyed:\n",
                log.test_run
            ),
            columns,
        ));
        for resource in &interrupt.planned {
            streams.eprintln(&format!("  - {resource}"));
        }
    }
}

fn print_resources(streams: &Streams, resources: &[TestFailedResource]) {
    for resource in resources {
        if resource.deposed_key.is_empty() {
            streams.eprintln(&format!(" - {}", resource.instance));
        } else {
            streams.eprintln(&format!(
                " - {} ({})",
                resource.instance, resource.deposed_key
            ));
        }
    }
}
