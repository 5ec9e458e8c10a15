//! Per-stream summary of a decoded container

use std::collections::HashMap;

use serde::Serialize;

use crate::registry::{classify, FormatKind, FormatTag};
use crate::section::{Body, Container};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub stream_id: u32,
    pub format: FormatTag,
    pub kind: FormatKind,
    /// Number of data sections
    pub sections: usize,
    /// Total payload bytes
    pub bytes: usize,
    /// Offset of the first data section, if the stream has any
    pub first_offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSummary {
    /// Streams in registration order
    pub streams: Vec<StreamSummary>,
    pub terminated: bool,
    pub trailing_bytes: usize,
}

pub fn inspect(container: &Container) -> ContainerSummary {
    let mut streams: Vec<StreamSummary> = container
        .streams()
        .iter()
        .map(|&stream_id| {
            let format = classify(stream_id);
            StreamSummary {
                stream_id,
                format,
                kind: format.kind(),
                sections: 0,
                bytes: 0,
                first_offset: None,
            }
        })
        .collect();
    let index: HashMap<u32, usize> = container
        .streams()
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect();

    for section in container.sections() {
        let Body::Data(payload) = section.body() else {
            continue;
        };
        // Decoding guarantees every data section belongs to a registered stream
        let Some(&i) = index.get(&section.type_code()) else {
            continue;
        };
        let stream = &mut streams[i];
        stream.sections += 1;
        stream.bytes += payload.len();
        stream.first_offset.get_or_insert(section.offset());
    }

    ContainerSummary {
        streams,
        terminated: container.is_terminated(),
        trailing_bytes: container.trailing_bytes(),
    }
}
