use crate::state::GalleryHandle;
use dioxus::prelude::*;
use mediagate_core::{Facet, FacetOptions, FilterSelection};

/// One group of checkboxes per facet. Every change rebuilds the playlist.
#[component]
pub fn FilterPanel(facets: FacetOptions, selection: FilterSelection) -> Element {
    let handle = use_context::<GalleryHandle>();

    rsx! {
        div {
            class: "filter-panel",

            for facet in Facet::ALL {
                {
                    let key = facet.query_key();
                    let label = facet.label();
                    let values = facets.values(facet);

                    rsx! {
                        fieldset {
                            key: "{key}",
                            class: "facet",

                            legend { "{label}" }

                            for value in values {
                                {
                                    let checked = selection.is_selected(facet, &value);
                                    let handle = handle.clone();
                                    let toggled = value.clone();

                                    rsx! {
                                        label {
                                            key: "{value}",
                                            class: "facet-option",

                                            input {
                                                r#type: "checkbox",
                                                checked,
                                                onchange: move |_: FormEvent| {
                                                    let value = toggled.clone();
                                                    handle.dispatch(move |controller| async move {
                                                        controller.toggle_facet_value(facet, &value).await;
                                                    });
                                                },
                                            }
                                            "{value}"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
