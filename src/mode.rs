/// 編集セッションの状態
///
/// Editing → Saving → Terminated の一方向にだけ進む。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Editing,
    Saving,
    Terminated,
}

pub struct StateManager {
    current: State,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            current: State::Editing,
        }
    }

    pub fn current(&self) -> State {
        self.current
    }

    pub fn enter_saving(&mut self) {
        if self.current == State::Editing {
            self.current = State::Saving;
        }
    }

    /// 保存の成否にかかわらず終了する
    pub fn enter_terminated(&mut self) {
        self.current = State::Terminated;
    }

    pub fn is_editing(&self) -> bool {
        self.current == State::Editing
    }

    pub fn is_terminated(&self) -> bool {
        self.current == State::Terminated
    }
}
