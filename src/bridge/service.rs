//! Control surface for external tools. Everything acts on the most recently
//! focused input context.

use super::Bridge;
use crate::host::Host;

impl Bridge {
    pub fn current_schema(&mut self, host: &mut dyn Host) -> String {
        match host.most_recent_input_context() {
            Some(ic) => self.state(ic).current_schema(),
            None => String::new(),
        }
    }

    pub fn list_all_schemas(&self) -> Vec<String> {
        self.runtime
            .api()
            .schema_list()
            .into_iter()
            .map(|schema| schema.schema_id)
            .collect()
    }

    pub fn set_schema(&mut self, host: &mut dyn Host, schema: &str) {
        let Some(ic) = host.most_recent_input_context() else {
            return;
        };
        self.state(ic).select_schema(schema);
        if ic.has_focus() {
            ic.show_input_method_information();
        }
    }

    pub fn is_ascii_mode(&mut self, host: &mut dyn Host) -> bool {
        match host.most_recent_input_context() {
            Some(ic) => self.state(ic).is_ascii_mode(),
            None => false,
        }
    }

    pub fn set_ascii_mode(&mut self, host: &mut dyn Host, ascii: bool) {
        let Some(ic) = host.most_recent_input_context() else {
            return;
        };
        self.state(ic).set_latin_mode(ascii);
        if ic.has_focus() {
            ic.show_input_method_information();
        }
    }
}
