//! Static view-model → view association table.
//!
//! Every view-model type maps to exactly one view. Associations are declared
//! up front with [`ViewFinderBuilder`]; a second association for the same
//! view-model type is rejected, so resolution never depends on declaration
//! order.

use std::any::{type_name, Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{HasViewModel, ViewError, ViewKind, ViewModel, Window};

type WindowFactory<VM> = Arc<dyn Fn(Arc<VM>) -> Arc<dyn Window> + Send + Sync>;

struct Association {
    view_model: &'static str,
    view: &'static str,
    kind: ViewKind,
    /// `WindowFactory<VM>` for window associations. Type-erased so a single
    /// table can hold factories for every view-model type; downcasting with
    /// the same `VM` recovers it.
    factory: Option<Box<dyn Any + Send + Sync>>,
}

/// Builder for [`ViewFinder`].
#[derive(Default)]
pub struct ViewFinderBuilder {
    associations: HashMap<TypeId, Association>,
}

impl ViewFinderBuilder {
    /// Associate view-model type `VM` with window type `W`.
    ///
    /// `factory` builds a fresh window each time the view-model is shown. It
    /// runs on the UI thread.
    pub fn associate_window<VM, W>(
        &mut self,
        factory: impl Fn() -> W + Send + Sync + 'static,
    ) -> Result<&mut Self, ViewError>
    where
        VM: ViewModel,
        W: Window + HasViewModel<VM>,
    {
        let create: WindowFactory<VM> = Arc::new(move |view_model: Arc<VM>| {
            let window = factory();
            HasViewModel::<VM>::set_view_model(&window, view_model);
            Arc::new(window) as Arc<dyn Window>
        });

        self.insert::<VM>(Association {
            view_model: type_name::<VM>(),
            view: type_name::<W>(),
            kind: ViewKind::Window,
            factory: Some(Box::new(create)),
        })?;
        Ok(self)
    }

    /// Associate view-model type `VM` with control type `C`.
    ///
    /// Controls are embedded by the host and cannot be shown on their own;
    /// resolving `VM` for display fails with `AssociatedViewNotWindow`.
    pub fn associate_control<VM, C>(&mut self) -> Result<&mut Self, ViewError>
    where
        VM: ViewModel,
        C: HasViewModel<VM>,
    {
        self.insert::<VM>(Association {
            view_model: type_name::<VM>(),
            view: type_name::<C>(),
            kind: ViewKind::Control,
            factory: None,
        })?;
        Ok(self)
    }

    pub fn build(self) -> ViewFinder {
        tracing::debug!(associations = self.associations.len(), "View finder built");
        ViewFinder {
            associations: self.associations,
        }
    }

    fn insert<VM: ViewModel>(&mut self, association: Association) -> Result<(), ViewError> {
        match self.associations.entry(TypeId::of::<VM>()) {
            Entry::Occupied(existing) => Err(ViewError::DuplicateAssociation {
                view_model: association.view_model,
                existing: existing.get().view,
                duplicate: association.view,
            }),
            Entry::Vacant(slot) => {
                tracing::trace!(
                    view_model = association.view_model,
                    view = association.view,
                    kind = ?association.kind,
                    "Registered view association"
                );
                slot.insert(association);
                Ok(())
            }
        }
    }
}

/// Resolves view-model types to the views that display them.
pub struct ViewFinder {
    associations: HashMap<TypeId, Association>,
}

impl ViewFinder {
    pub fn builder() -> ViewFinderBuilder {
        ViewFinderBuilder::default()
    }

    /// Find the window associated with `VM`.
    ///
    /// # Errors
    /// - `ViewNotFound` if nothing is associated with `VM`.
    /// - `AssociatedViewNotWindow` if `VM` is associated with a control.
    pub fn resolve<VM: ViewModel>(&self) -> Result<ViewBinding<VM>, ViewError> {
        let view_model = type_name::<VM>();
        let association = self
            .associations
            .get(&TypeId::of::<VM>())
            .ok_or(ViewError::ViewNotFound { view_model })?;

        if association.kind != ViewKind::Window {
            return Err(ViewError::AssociatedViewNotWindow {
                view_model,
                view: association.view,
            });
        }

        let factory = association
            .factory
            .as_ref()
            .and_then(|factory| factory.downcast_ref::<WindowFactory<VM>>())
            .ok_or(ViewError::ViewNotFound { view_model })?;

        Ok(ViewBinding {
            view: association.view,
            factory: Arc::clone(factory),
        })
    }

    /// Name and kind of the view associated with `VM`, if any.
    pub fn view_for<VM: ViewModel>(&self) -> Option<(&'static str, ViewKind)> {
        self.associations
            .get(&TypeId::of::<VM>())
            .map(|association| (association.view, association.kind))
    }

    pub fn len(&self) -> usize {
        self.associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }
}

impl fmt::Debug for ViewFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<_> = self
            .associations
            .values()
            .map(|association| (association.view_model, association.view))
            .collect();
        pairs.sort_unstable();
        f.debug_struct("ViewFinder")
            .field("associations", &pairs)
            .finish()
    }
}

/// A resolved window association for view-model type `VM`.
pub struct ViewBinding<VM: ViewModel> {
    view: &'static str,
    factory: WindowFactory<VM>,
}

impl<VM: ViewModel> ViewBinding<VM> {
    pub fn view_name(&self) -> &'static str {
        self.view
    }

    /// Build the window and hand it `view_model`. Call on the UI thread.
    pub fn create(&self, view_model: Arc<VM>) -> Arc<dyn Window> {
        (self.factory)(view_model)
    }
}

impl<VM: ViewModel> Clone for ViewBinding<VM> {
    fn clone(&self) -> Self {
        Self {
            view: self.view,
            factory: Arc::clone(&self.factory),
        }
    }
}
