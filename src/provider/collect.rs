use crate::model::{Component, ComponentRequest, LinkColumn, Occupant};

use super::parse::{RawChunk, RawComponent, RawLink};

/// Merges chunks in order and keeps the components overlapping the window.
///
/// `index` counts every merged component; `offset` only accumulates over the
/// kept ones, since the layout measures it from the first visible component.
pub(super) fn collect_components(chunks: &[&RawChunk], request: ComponentRequest) -> Vec<Component> {
    let mut components = Vec::new();
    let mut offset = 0;

    let merged = chunks.iter().flat_map(|chunk| chunk.components.iter());
    for (index, raw) in merged.enumerate() {
        if raw.last_bin < request.window.begin || raw.first_bin > request.window.end {
            continue;
        }

        let component = convert_component(index, raw, offset, request.use_connector);
        offset += (component.arrivals.len() + component.departures.len()) as i64 - 1;
        components.push(component);
    }

    components
}

fn convert_component(index: usize, raw: &RawComponent, offset: i64, use_connector: bool) -> Component {
    let mut arrivals = raw
        .arrivals
        .iter()
        .enumerate()
        .map(|(column, link)| convert_link(link, format!("{index}:a{column}")))
        .collect::<Vec<_>>();

    let mut departures = raw
        .departures
        .iter()
        .enumerate()
        .map(|(column, link)| convert_link(link, format!("{index}:d{column}")))
        .collect::<Vec<_>>();

    if !use_connector {
        arrivals.retain(|link| !link.is_connector());
        if let Some(closing) = departures.pop() {
            departures.retain(|link| !link.is_connector());
            departures.push(closing);
        }
    }

    let occupants = raw
        .occupants
        .iter()
        .enumerate()
        .map(|(path, present)| present.then_some(Occupant { path }))
        .collect();

    Component::new(
        index,
        raw.first_bin,
        raw.last_bin,
        offset,
        arrivals,
        departures,
        occupants,
    )
}

fn convert_link(raw: &RawLink, key: String) -> LinkColumn {
    let participants = raw
        .participants
        .iter()
        .enumerate()
        .filter_map(|(row, present)| present.then_some(row))
        .collect();
    LinkColumn::new(raw.upstream, raw.downstream, key).with_participants(participants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BinWindow;

    fn chunk(json: &str) -> RawChunk {
        serde_json::from_str(json).unwrap()
    }

    fn sample() -> RawChunk {
        chunk(
            r#"{
                "first_bin": 1, "last_bin": 9, "path_names": ["a", "b"],
                "components": [
                    {"first_bin": 1, "last_bin": 3, "occupants": [true, false],
                     "arrivals": [],
                     "departures": [{"upstream": 3, "downstream": 9}, {"upstream": 3, "downstream": 4},
                                    {"upstream": 3, "downstream": 4}]},
                    {"first_bin": 4, "last_bin": 5, "occupants": [true, true],
                     "arrivals": [{"upstream": 3, "downstream": 4, "participants": [false, true]}],
                     "departures": [{"upstream": 5, "downstream": 6}, {"upstream": 5, "downstream": 6}]},
                    {"first_bin": 6, "last_bin": 9, "occupants": [false, true],
                     "arrivals": [{"upstream": 5, "downstream": 6}, {"upstream": 3, "downstream": 9}],
                     "departures": [{"upstream": 9, "downstream": 10}]}
                ]
            }"#,
        )
    }

    fn request(begin: i64, end: i64, use_connector: bool) -> ComponentRequest {
        ComponentRequest {
            window: BinWindow::new(begin, end),
            use_connector,
        }
    }

    #[test]
    fn offsets_accumulate_link_columns() {
        let raw = sample();
        let components = collect_components(&[&raw], request(1, 9, true));

        let offsets = components.iter().map(|c| c.offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![0, 2, 4]);
        assert_eq!(components[2].num_bin, 4);
        assert_eq!(components[1].arrivals[0].participants, vec![1]);
        assert_eq!(components[0].occupants, vec![Some(Occupant { path: 0 }), None]);
    }

    #[test]
    fn window_keeps_global_index_and_restarts_offset() {
        let raw = sample();
        let components = collect_components(&[&raw], request(4, 9, true));

        assert_eq!(components.len(), 2);
        assert_eq!(components[0].index, 1);
        assert_eq!(components[0].offset, 0);
        assert_eq!(components[1].offset, 2);
    }

    #[test]
    fn connector_filter_keeps_closing_departure() {
        let raw = sample();
        let components = collect_components(&[&raw], request(1, 9, false));

        let first = &components[0];
        assert_eq!(first.departures.len(), 2);
        assert_eq!(first.departures[0].pair(), (3, 9));
        assert_eq!(first.departures[1].pair(), (3, 4));

        assert!(components[1].arrivals.is_empty());
        assert_eq!(components[1].departures.len(), 1);

        let last = &components[2];
        assert_eq!(last.arrivals.len(), 1);
        assert_eq!(last.departures.len(), 1);
    }

    #[test]
    fn chunks_merge_in_order() {
        let left = sample();
        let right = chunk(
            r#"{"first_bin": 10, "last_bin": 12, "components": [
                {"first_bin": 10, "last_bin": 12, "arrivals": [{"upstream": 9, "downstream": 10}],
                 "departures": [{"upstream": 12, "downstream": 13}]}
            ]}"#,
        );
        let components = collect_components(&[&left, &right], request(1, 12, true));

        assert_eq!(components.len(), 4);
        assert_eq!(components[3].index, 3);
        assert_eq!(components[3].first_bin, 10);
        assert_eq!(components[3].offset, 4 + 2 + 1 - 1);
    }
}
