use the_lib::autocomplete::Autocomplete;

const RESULT_CLASS: &str = "components-autocomplete__result";

/// ARIA wiring for the editable element hosting the popup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBoxProps {
  pub is_expanded: bool,
  pub list_box_id: Option<String>,
  pub active_id:   Option<String>,
}

/// One rendered result (`role="option"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
  pub key:        String,
  pub id:         String,
  pub label:      String,
  pub selected:   bool,
  pub disabled:   bool,
  pub class_name: String,
}

/// Everything a host needs to draw the popup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBox {
  pub props: ListBoxProps,
  pub items: Vec<ResultItem>,
}

pub fn list_box_id(instance_id: usize) -> String {
  format!("components-autocomplete-listbox-{instance_id}")
}

pub fn result_id(instance_id: usize, key: &str) -> String {
  format!("components-autocomplete-item-{instance_id}-{key}")
}

pub fn list_box_props(engine: &Autocomplete) -> ListBoxProps {
  let state = engine.state();
  if !state.is_expanded() {
    return ListBoxProps::default();
  }
  let instance = engine.instance_id();
  let selected_key = state.selected().map_or("", |keyed| keyed.key.as_str());
  ListBoxProps {
    is_expanded: true,
    list_box_id: Some(list_box_id(instance)),
    active_id:   Some(result_id(instance, selected_key)),
  }
}

pub fn build_list_box(engine: &Autocomplete) -> ListBox {
  let props = list_box_props(engine);
  if !props.is_expanded {
    return ListBox::default();
  }

  let state = engine.state();
  let completer_class = state
    .open
    .and_then(|open| engine.registry().get(open))
    .and_then(|completer| completer.class_name().map(str::to_string));
  let items = state
    .filtered_options
    .iter()
    .enumerate()
    .map(|(index, keyed)| {
      let selected = index == state.selected_index;
      let mut class_name = RESULT_CLASS.to_string();
      if let Some(extra) = &completer_class {
        class_name.push(' ');
        class_name.push_str(extra);
      }
      if selected {
        class_name.push_str(" is-selected");
      }
      ResultItem {
        key: keyed.key.clone(),
        id: result_id(engine.instance_id(), &keyed.key),
        label: keyed.option.label.clone(),
        selected,
        disabled: keyed.option.is_disabled,
        class_name,
      }
    })
    .collect();

  ListBox { props, items }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn ids_follow_instance_and_key() {
    assert_eq!(list_box_id(3), "components-autocomplete-listbox-3");
    assert_eq!(result_id(3, "0_1"), "components-autocomplete-item-3-0_1");
  }
}
