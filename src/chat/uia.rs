//! Live chat window through UI Automation.
//!
//! Finds the top-level window by class name, then the chat content list by
//! element name, and walks its children with the raw view walker from the
//! last child backwards. Structure changes on the list's children are
//! forwarded to the observer as re-check requests.

use tracing::{debug, info};
use windows::core::{implement, Ref, Result as WinResult, BSTR, VARIANT};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED, SAFEARRAY,
};
use windows::Win32::UI::Accessibility::{
    CUIAutomation, IUIAutomation, IUIAutomationCacheRequest, IUIAutomationElement,
    IUIAutomationStructureChangedEventHandler, IUIAutomationStructureChangedEventHandler_Impl,
    IUIAutomationTreeWalker, StructureChangeType, TreeScope_Children, TreeScope_Descendants,
    UIA_ClassNamePropertyId, UIA_ControlTypePropertyId, UIA_NamePropertyId,
    UIA_WindowControlTypeId,
};

use super::{ChangeNotifier, ChatSource};
use crate::error::SpeakerError;

fn automation_error(e: windows::core::Error) -> SpeakerError {
    SpeakerError::Automation(e.to_string())
}

pub struct UiaSource {
    automation: IUIAutomation,
    walker: IUIAutomationTreeWalker,
    content: IUIAutomationElement,
    subscribed: bool,
}

impl UiaSource {
    pub fn attach(window_class: &str, content_name: &str) -> Result<Self, SpeakerError> {
        unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(automation_error)?;

            let automation: IUIAutomation =
                CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER)
                    .map_err(automation_error)?;
            let root = automation.GetRootElement().map_err(automation_error)?;

            let is_window = automation
                .CreatePropertyCondition(
                    UIA_ControlTypePropertyId,
                    &VARIANT::from(UIA_WindowControlTypeId.0),
                )
                .map_err(automation_error)?;
            let has_class = automation
                .CreatePropertyCondition(
                    UIA_ClassNamePropertyId,
                    &VARIANT::from(BSTR::from(window_class)),
                )
                .map_err(automation_error)?;
            let window_condition = automation
                .CreateAndCondition(&is_window, &has_class)
                .map_err(automation_error)?;

            // A null element comes back as an error from the bindings.
            let window = root
                .FindFirst(TreeScope_Children, &window_condition)
                .map_err(|_| SpeakerError::WindowNotFound(window_class.to_string()))?;
            debug!("Found chat window (class {window_class})");

            let named = automation
                .CreatePropertyCondition(
                    UIA_NamePropertyId,
                    &VARIANT::from(BSTR::from(content_name)),
                )
                .map_err(automation_error)?;
            let content = window
                .FindFirst(TreeScope_Descendants, &named)
                .map_err(|_| SpeakerError::RegionNotFound(content_name.to_string()))?;

            let walker = automation.RawViewWalker().map_err(automation_error)?;

            info!("Attached to '{content_name}' in {window_class} window");

            Ok(Self {
                automation,
                walker,
                content,
                subscribed: false,
            })
        }
    }
}

/// Lazily walks previous siblings; stops at the first element the walker
/// can't produce. Elements whose name can't be read are skipped.
struct SiblingWalk<'a> {
    walker: &'a IUIAutomationTreeWalker,
    next: Option<IUIAutomationElement>,
}

impl Iterator for SiblingWalk<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let element = self.next.take()?;
            unsafe {
                self.next = self.walker.GetPreviousSiblingElement(&element).ok();
                match element.CurrentName() {
                    Ok(name) => return Some(name.to_string()),
                    Err(e) => debug!("Skipping chat node with unreadable name: {e}"),
                }
            }
        }
    }
}

impl ChatSource for UiaSource {
    fn newest_first(&self) -> Result<Box<dyn Iterator<Item = String> + '_>, SpeakerError> {
        let last = unsafe { self.walker.GetLastChildElement(&self.content) }.ok();
        Ok(Box::new(SiblingWalk {
            walker: &self.walker,
            next: last,
        }))
    }

    fn subscribe(&mut self, notifier: ChangeNotifier) -> Result<(), SpeakerError> {
        let handler: IUIAutomationStructureChangedEventHandler =
            StructureChanged { notifier }.into();
        unsafe {
            self.automation
                .AddStructureChangedEventHandler(
                    &self.content,
                    TreeScope_Children,
                    None::<&IUIAutomationCacheRequest>,
                    &handler,
                )
                .map_err(automation_error)?;
        }
        self.subscribed = true;
        debug!("Subscribed to chat list structure changes");
        Ok(())
    }
}

impl Drop for UiaSource {
    fn drop(&mut self) {
        if self.subscribed {
            unsafe {
                let _ = self.automation.RemoveAllEventHandlers();
            }
        }
    }
}

#[implement(IUIAutomationStructureChangedEventHandler)]
struct StructureChanged {
    notifier: ChangeNotifier,
}

impl IUIAutomationStructureChangedEventHandler_Impl for StructureChanged_Impl {
    fn HandleStructureChangedEvent(
        &self,
        _sender: Ref<'_, IUIAutomationElement>,
        _changetype: StructureChangeType,
        _runtimeid: *const SAFEARRAY,
    ) -> WinResult<()> {
        // The event carries no reliable diff; just ask for a fresh read.
        self.notifier.notify();
        Ok(())
    }
}
